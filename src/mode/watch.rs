//! Refresh of the local catalog from store change events
//!
//! Peers learn about each other's writes only through this path. Events are
//! applied to the snapshot and never written back. Echoes of this node's own
//! writes arrive here too and leave the snapshot unchanged.

use super::context::ContextManager;
use crate::error::Result;
use crate::metadata::{Table, View};
use crate::persist::node::ROOT;
use crate::persist::{ChangeType, DataChangedEvent, MetaDataNode};
use crate::yaml;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// Applies metadata change events to a [`ContextManager`].
pub struct MetaDataWatcher;

impl MetaDataWatcher {
    /// Subscribe `context` to every change under the metadata root.
    ///
    /// The listener holds a weak reference; once the context manager is
    /// dropped, further events are ignored.
    pub fn register(context: &Arc<ContextManager>) -> Result<()> {
        let weak: Weak<ContextManager> = Arc::downgrade(context);
        context.persist_service().repository().watch(
            ROOT,
            Arc::new(move |event: &DataChangedEvent| {
                if let Some(context) = weak.upgrade() {
                    Self::handle(&context, event);
                }
            }),
        )
    }

    /// Apply one event. Keys outside the metadata layout are ignored;
    /// documents that fail to parse are logged and skipped.
    pub fn handle(context: &ContextManager, event: &DataChangedEvent) {
        let Some(node) = MetaDataNode::parse(&event.key) else {
            debug!(key = %event.key, "ignoring change outside metadata layout");
            return;
        };
        debug!(key = %event.key, change_type = %event.change_type, "metadata changed");
        match event.change_type {
            ChangeType::Added | ChangeType::Updated => Self::on_upsert(context, node, event),
            ChangeType::Deleted => Self::on_delete(context, node),
        }
    }

    fn on_upsert(context: &ContextManager, node: MetaDataNode, event: &DataChangedEvent) {
        match node {
            MetaDataNode::Database { database } => {
                context.add_database(&database);
            }
            MetaDataNode::Tables { database, schema } => {
                context.add_database(&database);
                context.add_schema(&database, &schema);
            }
            MetaDataNode::Table {
                database,
                schema,
                table,
            } => {
                let mut loaded: Table = match yaml::from_document(&event.key, Some(&event.value)) {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        warn!(key = %event.key, error = %e, "skipping malformed table document");
                        return;
                    }
                };
                if loaded.name().is_empty() {
                    loaded.set_name(table);
                }
                context.add_database(&database);
                context.add_schema(&database, &schema);
                context.put_tables(&database, &schema, &[loaded]);
            }
            MetaDataNode::View {
                database,
                schema,
                view,
            } => {
                let mut loaded: View = match yaml::from_document(&event.key, Some(&event.value)) {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        warn!(key = %event.key, error = %e, "skipping malformed view document");
                        return;
                    }
                };
                if loaded.name.is_empty() {
                    loaded.name = view;
                }
                context.add_database(&database);
                context.add_schema(&database, &schema);
                context.put_views(&database, &schema, &[loaded]);
            }
            MetaDataNode::Schemas { .. }
            | MetaDataNode::Schema { .. }
            | MetaDataNode::Views { .. } => {}
        }
    }

    fn on_delete(context: &ContextManager, node: MetaDataNode) {
        match node {
            MetaDataNode::Database { database } => {
                context.drop_database(&database);
            }
            MetaDataNode::Schema { database, schema }
            | MetaDataNode::Tables { database, schema } => {
                context.drop_schema(&database, &schema);
            }
            MetaDataNode::Table {
                database,
                schema,
                table,
            } => {
                context.remove_tables(&database, &schema, &[table]);
            }
            MetaDataNode::View {
                database,
                schema,
                view,
            } => {
                context.remove_views(&database, &schema, &[view]);
            }
            MetaDataNode::Schemas { .. } | MetaDataNode::Views { .. } => {}
        }
    }
}

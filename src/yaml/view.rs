//! View document model.

use super::YamlProjection;
use crate::metadata::View;
use serde::{Deserialize, Serialize};

/// Persisted form of a view: always `name` then `viewDefinition`, both present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlView {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub view_definition: String,
}

impl YamlProjection for View {
    type Document = YamlView;

    fn to_yaml(&self) -> YamlView {
        YamlView {
            name: self.name.clone(),
            view_definition: self.definition.clone(),
        }
    }

    fn from_yaml(document: YamlView) -> View {
        View::new(document.name, document.view_definition)
    }
}

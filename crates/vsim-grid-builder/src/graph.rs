//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;

use crate::model::{Asset, AssetType, SubType};

/// Structural problems detected in a built or fetched asset graph.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("zone rule #{index} is invalid: {reason}")]
    InvalidRule { index: usize, reason: String },
    #[error("duplicate asset id `{0}`")]
    DuplicateId(String),
    #[error("graph has no root site")]
    MissingRoot,
    #[error("graph has more than one root: {0:?}")]
    MultipleRoots(Vec<String>),
    #[error("asset `{id}` belongs to unknown parent `{parent}`")]
    DanglingParent { id: String, parent: String },
    #[error("asset `{id}` lists unknown child `{child}`")]
    DanglingChild { id: String, child: String },
    #[error("asset `{child}` is listed by `{listed_by}` but belongs to {belongs:?}")]
    ParentMismatch {
        child: String,
        listed_by: String,
        belongs: Option<String>,
    },
    #[error("asset `{id}` is listed {count} times across belongings")]
    ListedMultipleTimes { id: String, count: usize },
    #[error("asset `{id}` is not listed by its parent `{parent}`")]
    NotListed { id: String, parent: String },
    #[error("asset `{0}` has unknown zone classification")]
    UnknownZone(String),
    #[error("graph has no {0} asset to station staff in")]
    NoStation(AssetType),
}

/// Ordered, id-indexed set of assets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetGraph {
    assets: IndexMap<String, Asset>,
}

impl AssetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a list of assets, rejecting duplicate ids.
    pub fn from_assets(assets: Vec<Asset>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for asset in assets {
            graph.insert(asset)?;
        }
        Ok(graph)
    }

    pub fn insert(&mut self, asset: Asset) -> Result<(), GraphError> {
        if self.assets.contains_key(&asset.id) {
            return Err(GraphError::DuplicateId(asset.id));
        }
        self.assets.insert(asset.id.clone(), asset);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Asset> {
        self.assets.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.assets.into_values().collect()
    }

    pub fn count_type(&self, asset_type: AssetType) -> usize {
        self.iter().filter(|a| a.asset_type == asset_type).count()
    }

    pub fn count_sub_type(&self, sub_type: SubType) -> usize {
        self.iter().filter(|a| a.sub_type == Some(sub_type)).count()
    }

    /// Non-container assets, in graph order.
    pub fn devices(&self) -> impl Iterator<Item = &Asset> {
        self.iter().filter(|a| !a.is_container())
    }

    /// Check that the graph is a single tree whose `belongs` and `belongings`
    /// links agree, with no `unknown` zones.
    pub fn validate(&self) -> Result<(), GraphError> {
        let roots: Vec<String> = self
            .iter()
            .filter(|a| a.belongs.is_none())
            .map(|a| a.id.clone())
            .collect();
        match roots.len() {
            0 => return Err(GraphError::MissingRoot),
            1 => {}
            _ => return Err(GraphError::MultipleRoots(roots)),
        }

        let mut listed: HashMap<&str, usize> = HashMap::new();
        for asset in self.iter() {
            if asset.sub_type == Some(SubType::Unknown) {
                return Err(GraphError::UnknownZone(asset.id.clone()));
            }
            if let Some(parent) = &asset.belongs {
                if !self.assets.contains_key(parent) {
                    return Err(GraphError::DanglingParent {
                        id: asset.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            for child_id in &asset.belongings {
                let child = self.get(child_id).ok_or_else(|| GraphError::DanglingChild {
                    id: asset.id.clone(),
                    child: child_id.clone(),
                })?;
                if child.belongs.as_deref() != Some(asset.id.as_str()) {
                    return Err(GraphError::ParentMismatch {
                        child: child_id.clone(),
                        listed_by: asset.id.clone(),
                        belongs: child.belongs.clone(),
                    });
                }
                *listed.entry(child_id.as_str()).or_default() += 1;
            }
        }

        for asset in self.iter() {
            let Some(parent) = &asset.belongs else {
                continue;
            };
            match listed.get(asset.id.as_str()).copied().unwrap_or(0) {
                0 => {
                    return Err(GraphError::NotListed {
                        id: asset.id.clone(),
                        parent: parent.clone(),
                    })
                }
                1 => {}
                count => {
                    return Err(GraphError::ListedMultipleTimes {
                        id: asset.id.clone(),
                        count,
                    })
                }
            }
        }
        Ok(())
    }
}

impl IntoIterator for AssetGraph {
    type Item = Asset;
    type IntoIter = indexmap::map::IntoValues<String, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_values()
    }
}

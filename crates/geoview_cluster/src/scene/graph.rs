//! Minimal scene graph model
//!
//! The rendering engine owns the real graph; this tree carries only the nodes
//! the coordination layer queries.

/// Reference ellipsoid of a spatial reference system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius in meters
    pub radius_equator: f64,
    /// Polar radius in meters
    pub radius_polar: f64,
}

impl Ellipsoid {
    /// WGS84 reference ellipsoid
    pub const WGS84: Self = Self {
        radius_equator: 6_378_137.0,
        radius_polar: 6_356_752.314_245,
    };
}

/// Map profile: the spatial reference of a map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    /// Reference ellipsoid
    pub ellipsoid: Ellipsoid,
}

/// Root of a terrain map
#[derive(Debug, Clone, PartialEq)]
pub struct MapNode {
    /// Map name
    pub name: String,
    /// Spatial reference; maps without one cannot be geocentric
    pub profile: Option<Profile>,
    geocentric: bool,
}

impl MapNode {
    /// A planet-relative map
    pub fn geocentric(name: impl Into<String>, ellipsoid: Ellipsoid) -> Self {
        Self {
            name: name.into(),
            profile: Some(Profile { ellipsoid }),
            geocentric: true,
        }
    }

    /// A flat, projected map
    pub fn projected(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            geocentric: false,
        }
    }

    /// Whether the map is planet-relative with a known ellipsoid
    pub fn is_geocentric(&self) -> bool {
        self.geocentric && self.profile.is_some()
    }

    /// Ellipsoid of the map's profile
    pub fn ellipsoid(&self) -> Option<&Ellipsoid> {
        self.profile.as_ref().map(|profile| &profile.ellipsoid)
    }
}

/// Sky decoration attached to geocentric scenes
#[derive(Debug, Clone, PartialEq)]
pub struct SkyNode {
    /// Ellipsoid the sky is placed around
    pub ellipsoid: Ellipsoid,
    /// Whether the sun position follows the calendar time every frame
    pub tracks_calendar_time: bool,
}

impl SkyNode {
    /// Sky for a map
    pub fn for_map(map: &MapNode) -> Option<Self> {
        map.ellipsoid().map(|ellipsoid| Self {
            ellipsoid: *ellipsoid,
            tracks_calendar_time: true,
        })
    }
}

/// Scene graph node
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    /// Grouping node
    Group(Vec<SceneNode>),
    /// Opaque model loaded from a file
    Model {
        /// Model name
        name: String,
    },
    /// Terrain map root
    Map(MapNode),
    /// Sky decoration
    Sky(SkyNode),
}

impl SceneNode {
    /// Opaque model node
    pub fn model(name: impl Into<String>) -> Self {
        Self::Model { name: name.into() }
    }

    /// Breadth-first search so the topmost match wins
    fn find_topmost<'a, T>(&'a self, pick: impl Fn(&'a SceneNode) -> Option<&'a T>) -> Option<&'a T> {
        let mut level = vec![self];
        while !level.is_empty() {
            if let Some(found) = level.iter().find_map(|&node| pick(node)) {
                return Some(found);
            }
            level = level
                .into_iter()
                .flat_map(|node| match node {
                    SceneNode::Group(children) => children.iter().collect(),
                    _ => Vec::new(),
                })
                .collect();
        }
        None
    }

    /// Topmost map node in this subtree
    pub fn find_map_node(&self) -> Option<&MapNode> {
        self.find_topmost(|node| match node {
            SceneNode::Map(map) => Some(map),
            _ => None,
        })
    }

    /// Topmost sky node in this subtree
    pub fn find_sky(&self) -> Option<&SkyNode> {
        self.find_topmost(|node| match node {
            SceneNode::Sky(sky) => Some(sky),
            _ => None,
        })
    }

    /// Append a child; non-group nodes are wrapped in a group first
    pub fn add_child(&mut self, child: SceneNode) {
        if let SceneNode::Group(children) = self {
            children.push(child);
            return;
        }
        let previous = std::mem::replace(self, SceneNode::Group(Vec::new()));
        if let SceneNode::Group(children) = self {
            children.push(previous);
            children.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topmost_map_wins() {
        let root = SceneNode::Group(vec![
            SceneNode::Group(vec![SceneNode::Map(MapNode::projected("deep"))]),
            SceneNode::Map(MapNode::geocentric("shallow", Ellipsoid::WGS84)),
        ]);
        assert_eq!(root.find_map_node().map(|map| map.name.as_str()), Some("shallow"));
    }

    #[test]
    fn test_add_child_wraps_leaf() {
        let mut node = SceneNode::model("tank");
        node.add_child(SceneNode::model("tree"));

        match node {
            SceneNode::Group(children) => assert_eq!(children.len(), 2),
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_sky_requires_profile() {
        assert!(SkyNode::for_map(&MapNode::projected("flat")).is_none());
        assert!(SkyNode::for_map(&MapNode::geocentric("earth", Ellipsoid::WGS84)).is_some());
    }
}

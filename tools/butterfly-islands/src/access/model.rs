//! Transport mode hierarchy
//!
//! The hierarchy is an arena of [`TransportMode`] records addressed by
//! [`ModeId`]. Each record carries two index-based relations:
//!
//! - the **family** chain (`all` → `land`/`water`/`rail` → mode), used to
//!   restrict expansion to one kind of transport and to pick the modes the
//!   detector analyses;
//! - the **inheritance** tree (`access` → `vehicle` → `motor_vehicle` → …)
//!   along which an access value propagates to more specific modes.
//!
//! Parents are always inserted before their children, so both relations are
//! acyclic by construction.
//!
//! See <https://wiki.openstreetmap.org/wiki/Key:access#Transport_mode_restrictions>

use std::collections::BTreeMap;

use crate::network::Tags;

/// Mode key → access value
pub type AccessMap = BTreeMap<String, String>;

/// Access values that permit routing
pub const POSITIVE_ACCESS: [&str; 9] = [
    "yes",
    "official",
    "designated",
    "destination",
    "delivery",
    "customers",
    "permissive",
    "agricultural",
    "forestry",
];

/// Access values that forbid routing
pub const NEGATIVE_ACCESS: [&str; 2] = ["private", "no"];

/// Index of a mode inside an [`AccessModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(u16);

impl ModeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct TransportMode {
    pub key: &'static str,
    /// Family parent; `None` only for the root `all`
    pub family: Option<ModeId>,
    /// Inheritance parent; `None` for `access` and the family nodes
    pub parent: Option<ModeId>,
    /// Inheritance children in insertion order
    pub children: Vec<ModeId>,
}

/// Immutable registry of transport modes, built once and shared by reference
#[derive(Debug, Clone)]
pub struct AccessModel {
    modes: Vec<TransportMode>,
    root: ModeId,
    access: ModeId,
    /// `access` followed by all of its inheritance descendants (pre-order)
    transport_modes: Vec<ModeId>,
}

struct ModelBuilder {
    modes: Vec<TransportMode>,
}

impl ModelBuilder {
    fn insert(&mut self, key: &'static str, family: Option<ModeId>, parent: Option<ModeId>) -> ModeId {
        debug_assert!(
            self.modes.iter().all(|m| !m.key.eq_ignore_ascii_case(key)),
            "duplicate transport mode '{key}'"
        );
        debug_assert!(
            family.into_iter().chain(parent).all(|p| p.index() < self.modes.len()),
            "unknown parent for transport mode '{key}'"
        );
        let id = ModeId(self.modes.len() as u16);
        self.modes.push(TransportMode {
            key,
            family,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.modes[parent.index()].children.push(id);
        }
        id
    }

    fn mode(&mut self, key: &'static str, family: ModeId, parent: ModeId) -> ModeId {
        self.insert(key, Some(family), Some(parent))
    }

    fn modes(&mut self, family: ModeId, parent: ModeId, keys: &[&'static str]) {
        for key in keys {
            self.mode(key, family, parent);
        }
    }
}

impl AccessModel {
    /// The default OSM access inheritance
    pub fn standard() -> Self {
        let mut b = ModelBuilder { modes: Vec::new() };

        let all = b.insert("all", None, None);
        let land = b.insert("land", Some(all), None);
        let water = b.insert("water", Some(all), None);
        let rail = b.insert("rail", Some(all), None);
        let access = b.insert("access", Some(all), None);

        // Land
        b.mode("foot", land, access);
        let ski = b.mode("ski", land, access);
        b.modes(land, access, &["inline_skates", "ice_skates", "horse"]);
        let vehicle = b.mode("vehicle", land, access);
        b.modes(land, ski, &["ski:nordic", "ski:alpine", "ski:telemark"]);
        b.modes(land, vehicle, &["bicycle", "carriage"]);
        let trailer = b.mode("trailer", land, vehicle);
        let motor_vehicle = b.mode("motor_vehicle", land, vehicle);
        b.mode("caravan", land, trailer);
        b.modes(
            land,
            motor_vehicle,
            &[
                "motorcycle",
                "moped",
                "mofa",
                "motorcar",
                "motorhome",
                "tourist_bus",
                "coach",
                "goods",
            ],
        );
        let hgv = b.mode("hgv", land, motor_vehicle);
        b.modes(
            land,
            motor_vehicle,
            &["agricultural", "golf_cart", "atv", "snowmobile"],
        );
        let psv = b.mode("psv", land, motor_vehicle);
        b.modes(
            land,
            motor_vehicle,
            &["hov", "car_sharing", "emergency", "hazmat", "disabled"],
        );
        b.mode("hgv_articulated", land, hgv);
        b.modes(land, psv, &["bus", "minibus", "share_taxi", "taxi"]);

        // Water
        b.mode("swimming", water, access);
        let boat = b.mode("boat", water, access);
        b.mode("fishing_vessel", water, access);
        let ship = b.mode("ship", water, access);
        b.modes(water, boat, &["motorboat", "sailboat", "canoe"]);
        b.mode("passenger", water, ship);
        let cargo = b.mode("cargo", water, ship);
        b.mode("isps", water, ship);
        b.modes(water, cargo, &["bulk"]);
        let tanker = b.mode("tanker", water, cargo);
        b.modes(water, cargo, &["container", "imdg"]);
        b.modes(
            water,
            tanker,
            &["tanker:gas", "tanker:oil", "tanker:chemical", "tanker:singlehull"],
        );

        // Rail
        b.mode("train", rail, access);

        let mut model = Self {
            modes: b.modes,
            root: all,
            access,
            transport_modes: Vec::new(),
        };
        model.transport_modes = model.descendants(access, None);
        model
    }

    pub fn root(&self) -> ModeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn mode(&self, id: ModeId) -> &TransportMode {
        &self.modes[id.index()]
    }

    pub fn key(&self, id: ModeId) -> &'static str {
        self.modes[id.index()].key
    }

    /// Case-insensitive lookup of a mode key
    pub fn get(&self, key: &str) -> Option<ModeId> {
        self.modes
            .iter()
            .position(|m| m.key.eq_ignore_ascii_case(key))
            .map(|i| ModeId(i as u16))
    }

    /// All mode keys in arena order
    pub fn keys(&self) -> Vec<&'static str> {
        self.modes.iter().map(|m| m.key).collect()
    }

    /// True if `family` is `mode` or one of its family ancestors
    pub fn in_family(&self, mode: ModeId, family: ModeId) -> bool {
        let mut current = Some(mode);
        while let Some(id) = current {
            if id == family {
                return true;
            }
            current = self.modes[id.index()].family;
        }
        false
    }

    /// Every mode in `family`, the family itself included
    pub fn modes_under(&self, family: ModeId) -> Vec<ModeId> {
        (0..self.modes.len())
            .map(|i| ModeId(i as u16))
            .filter(|&id| self.in_family(id, family))
            .collect()
    }

    /// Modes the detector analyses for a family: the leaves of the
    /// inheritance tree inside it, in pre-order
    pub fn analysis_modes(&self, family: ModeId) -> Vec<ModeId> {
        self.transport_modes
            .iter()
            .copied()
            .filter(|&id| id != family && self.in_family(id, family))
            .filter(|&id| self.modes[id.index()].children.is_empty())
            .collect()
    }

    /// Family node (`land`, `water`, `rail`) a mode belongs to
    pub fn family_of(&self, mode: ModeId) -> Option<ModeId> {
        let mut current = mode;
        while let Some(family) = self.modes[current.index()].family {
            if family == self.root {
                return Some(current);
            }
            current = family;
        }
        None
    }

    /// Pre-order inheritance tree below `access`, limited to `family`
    pub fn inheritance_tree(&self, family: ModeId) -> Vec<ModeId> {
        self.descendants(self.access, Some(family))
    }

    /// `access` and every mode that inherits from it
    pub fn transport_modes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.transport_modes.iter().map(|&id| self.key(id))
    }

    pub fn is_transport_mode(&self, key: &str) -> bool {
        self.transport_modes.iter().any(|&id| self.key(id) == key)
    }

    /// Number of inheritance ancestors of `mode` (0 for unknown keys)
    pub fn depth(&self, mode: &str) -> usize {
        let Some(id) = self.get(mode) else {
            return 0;
        };
        let mut depth = 0;
        let mut current = self.modes[id.index()].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.modes[parent.index()].parent;
        }
        depth
    }

    /// Pre-order inheritance walk from `start`; children outside `within`
    /// are pruned together with their subtrees
    fn descendants(&self, start: ModeId, within: Option<ModeId>) -> Vec<ModeId> {
        let mut out = vec![start];
        let mut stack: Vec<ModeId> = self.modes[start.index()]
            .children
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(id) = stack.pop() {
            if let Some(family) = within {
                if !self.in_family(id, family) {
                    continue;
                }
            }
            out.push(id);
            stack.extend(self.modes[id.index()].children.iter().rev().copied());
        }
        out
    }

    /// `{mode: value}` plus `value` for every inheritance descendant of
    /// `mode` inside `within` (`None` means the whole tree)
    pub fn expand(&self, mode: &str, value: &str, within: Option<ModeId>) -> AccessMap {
        let Some(id) = self.get(mode) else {
            return AccessMap::from([(mode.to_string(), value.to_string())]);
        };
        let mut expanded = AccessMap::new();
        expanded.insert(mode.to_string(), value.to_string());
        for child in self.descendants(id, within).into_iter().skip(1) {
            expanded.insert(self.key(child).to_string(), value.to_string());
        }
        expanded
    }

    /// Merge two access maps.
    ///
    /// When `a` has every key of `b`, `b` is the narrower map and wins on
    /// shared keys. Otherwise `a` wins on shared keys.
    pub fn merge(a: &AccessMap, b: &AccessMap) -> AccessMap {
        let (base, overlay) = if b.keys().all(|k| a.contains_key(k)) {
            (a, b)
        } else {
            (b, a)
        };
        let mut merged = base.clone();
        merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Expand every entry and fold the expansions, broadest first, so that
    /// narrower explicit values override inherited ones
    pub fn expand_values(&self, values: &AccessMap) -> AccessMap {
        let mut expansions: Vec<AccessMap> = values
            .iter()
            .map(|(mode, value)| self.expand(mode, value, None))
            .collect();
        expansions.sort_by(|a, b| b.len().cmp(&a.len()));

        expansions
            .iter()
            .fold(AccessMap::new(), |merged, expansion| Self::merge(&merged, expansion))
    }

    /// Implied access values of explicitly tagged modes, restricted to a
    /// family (`hgv=designated` also yields `hgv_articulated=designated`)
    pub fn access_values(&self, tags: &Tags, family: ModeId) -> AccessMap {
        let mut values = AccessMap::new();
        for mode in self.transport_modes() {
            if let Some(value) = tags.get_str(mode) {
                let expanded = self.expand(mode, value, Some(family));
                values = Self::merge(&values, &expanded);
            }
        }
        values
    }

    pub fn positive_values() -> &'static [&'static str] {
        &POSITIVE_ACCESS
    }

    pub fn is_positive(value: &str) -> bool {
        POSITIVE_ACCESS.contains(&value)
    }

    /// Every value with a defined routing meaning
    pub fn restriction_values() -> Vec<&'static str> {
        POSITIVE_ACCESS
            .iter()
            .chain(NEGATIVE_ACCESS.iter())
            .copied()
            .collect()
    }

    /// The `access` key, root of the inheritance tree
    pub fn access_key(&self) -> ModeId {
        self.access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> AccessMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_root_and_acyclic() {
        let model = AccessModel::standard();
        let roots: Vec<_> = (0..model.len())
            .map(|i| ModeId(i as u16))
            .filter(|&id| model.mode(id).family.is_none())
            .collect();
        assert_eq!(roots, vec![model.root()]);
        assert_eq!(model.key(model.root()), "all");

        // Parents always precede children, so every upward walk terminates
        for i in 0..model.len() {
            let mode = model.mode(ModeId(i as u16));
            if let Some(f) = mode.family {
                assert!(f.index() < i, "{} family out of order", mode.key);
            }
            if let Some(p) = mode.parent {
                assert!(p.index() < i, "{} parent out of order", mode.key);
            }
        }
    }

    #[test]
    fn test_keys_are_unique() {
        let model = AccessModel::standard();
        let mut keys = model.keys();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let model = AccessModel::standard();
        assert_eq!(model.get("BICYCLE"), model.get("bicycle"));
        assert!(model.get("bicycle").is_some());
        assert!(model.get("hovercraft").is_none());
    }

    #[test]
    fn test_expand_vehicle() {
        let model = AccessModel::standard();
        let expanded = model.expand("vehicle", "no", None);
        assert_eq!(expanded.get("vehicle").map(String::as_str), Some("no"));
        assert_eq!(expanded.get("bicycle").map(String::as_str), Some("no"));
        assert_eq!(expanded.get("motorcar").map(String::as_str), Some("no"));
        assert_eq!(expanded.get("hgv_articulated").map(String::as_str), Some("no"));
        assert_eq!(expanded.get("caravan").map(String::as_str), Some("no"));
        assert!(!expanded.contains_key("foot"));
        assert!(!expanded.contains_key("access"));
    }

    #[test]
    fn test_expand_unknown_mode() {
        let model = AccessModel::standard();
        assert_eq!(
            model.expand("highway", "residential", None),
            map(&[("highway", "residential")])
        );
    }

    #[test]
    fn test_expand_restricted_to_family() {
        let model = AccessModel::standard();
        let land = model.get("land").unwrap();
        let water = model.get("water").unwrap();

        let on_land = model.expand("access", "yes", Some(land));
        assert!(on_land.contains_key("access"));
        assert!(on_land.contains_key("foot"));
        assert!(on_land.contains_key("bus"));
        assert!(!on_land.contains_key("boat"));
        assert!(!on_land.contains_key("train"));

        let on_water = model.expand("access", "yes", Some(water));
        assert!(on_water.contains_key("tanker:gas"));
        assert!(!on_water.contains_key("foot"));
    }

    #[test]
    fn test_merge_narrow_wins_when_contained() {
        let broad = map(&[("vehicle", "yes"), ("bicycle", "yes"), ("motorcar", "yes")]);
        let narrow = map(&[("bicycle", "no")]);
        let merged = AccessModel::merge(&broad, &narrow);
        assert_eq!(merged.get("bicycle").map(String::as_str), Some("no"));
        assert_eq!(merged.get("motorcar").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_merge_left_wins_when_not_contained() {
        let a = map(&[("bicycle", "no")]);
        let b = map(&[("vehicle", "yes"), ("bicycle", "yes")]);
        let merged = AccessModel::merge(&a, &b);
        assert_eq!(merged.get("bicycle").map(String::as_str), Some("no"));
        assert_eq!(merged.get("vehicle").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_merge_equal_key_sets_favor_right() {
        let a = map(&[("foot", "no")]);
        let b = map(&[("foot", "yes")]);
        assert_eq!(AccessModel::merge(&a, &b), b);
    }

    #[test]
    fn test_expand_values_specific_overrides_general() {
        let model = AccessModel::standard();
        let expanded = model.expand_values(&map(&[("vehicle", "yes"), ("bicycle", "no")]));
        assert_eq!(expanded.get("bicycle").map(String::as_str), Some("no"));
        assert_eq!(expanded.get("motor_vehicle").map(String::as_str), Some("yes"));
        assert_eq!(expanded.get("bus").map(String::as_str), Some("yes"));

        // Independent of input order: the tree decides specificity
        let expanded = model.expand_values(&map(&[("motor_vehicle", "no"), ("access", "yes")]));
        assert_eq!(expanded.get("foot").map(String::as_str), Some("yes"));
        assert_eq!(expanded.get("bicycle").map(String::as_str), Some("yes"));
        assert_eq!(expanded.get("motorcar").map(String::as_str), Some("no"));
    }

    #[test]
    fn test_modes_under_is_inclusive() {
        let model = AccessModel::standard();
        let water = model.get("water").unwrap();
        let keys: Vec<_> = model.modes_under(water).into_iter().map(|id| model.key(id)).collect();
        assert!(keys.contains(&"water"));
        assert!(keys.contains(&"boat"));
        assert!(keys.contains(&"canoe"));
        assert!(!keys.contains(&"foot"));

        let all = model.modes_under(model.root());
        assert_eq!(all.len(), model.len());
    }

    #[test]
    fn test_analysis_modes_are_leaves() {
        let model = AccessModel::standard();
        let keys = |family: &str| -> Vec<&'static str> {
            model
                .analysis_modes(model.get(family).unwrap())
                .into_iter()
                .map(|id| model.key(id))
                .collect()
        };

        assert_eq!(
            keys("land"),
            vec![
                "foot",
                "ski:nordic",
                "ski:alpine",
                "ski:telemark",
                "inline_skates",
                "ice_skates",
                "horse",
                "bicycle",
                "carriage",
                "caravan",
                "motorcycle",
                "moped",
                "mofa",
                "motorcar",
                "motorhome",
                "tourist_bus",
                "coach",
                "goods",
                "hgv_articulated",
                "agricultural",
                "golf_cart",
                "atv",
                "snowmobile",
                "bus",
                "minibus",
                "share_taxi",
                "taxi",
                "hov",
                "car_sharing",
                "emergency",
                "hazmat",
                "disabled",
            ]
        );
        assert_eq!(
            keys("water"),
            vec![
                "swimming",
                "motorboat",
                "sailboat",
                "canoe",
                "fishing_vessel",
                "passenger",
                "bulk",
                "tanker:gas",
                "tanker:oil",
                "tanker:chemical",
                "tanker:singlehull",
                "container",
                "imdg",
                "isps",
            ]
        );
        assert_eq!(keys("rail"), vec!["train"]);
    }

    #[test]
    #[should_panic(expected = "duplicate transport mode")]
    fn test_builder_rejects_duplicate_key() {
        let mut b = ModelBuilder { modes: Vec::new() };
        let all = b.insert("all", None, None);
        let land = b.insert("land", Some(all), None);
        let access = b.insert("access", Some(all), None);
        b.mode("foot", land, access);
        b.mode("Foot", land, access);
    }

    #[test]
    #[should_panic(expected = "unknown parent")]
    fn test_builder_rejects_unknown_parent() {
        let mut b = ModelBuilder { modes: Vec::new() };
        let all = b.insert("all", None, None);
        b.insert("land", Some(all), Some(ModeId(7)));
    }

    #[test]
    fn test_inheritance_tree_is_preorder() {
        let model = AccessModel::standard();
        let rail = model.get("rail").unwrap();
        let keys: Vec<_> = model
            .inheritance_tree(rail)
            .into_iter()
            .map(|id| model.key(id))
            .collect();
        assert_eq!(keys, vec!["access", "train"]);

        let land = model.get("land").unwrap();
        let keys: Vec<_> = model
            .inheritance_tree(land)
            .into_iter()
            .map(|id| model.key(id))
            .collect();
        let ski = keys.iter().position(|&k| k == "ski").unwrap();
        assert_eq!(keys[ski + 1], "ski:nordic");
        assert!(!keys.contains(&"boat"));
    }

    #[test]
    fn test_family_of() {
        let model = AccessModel::standard();
        let land = model.get("land");
        assert_eq!(model.family_of(model.get("hgv_articulated").unwrap()), land);
        assert_eq!(model.family_of(model.get("land").unwrap()), land);
        assert_eq!(
            model.family_of(model.get("train").unwrap()),
            model.get("rail")
        );
        assert_eq!(model.family_of(model.get("access").unwrap()), None);
    }

    #[test]
    fn test_depth() {
        let model = AccessModel::standard();
        assert_eq!(model.depth("access"), 0);
        assert_eq!(model.depth("foot"), 1);
        assert_eq!(model.depth("motor_vehicle"), 2);
        assert_eq!(model.depth("hgv_articulated"), 4);
        assert_eq!(model.depth("unknown"), 0);
    }

    #[test]
    fn test_access_values_from_tags() {
        let model = AccessModel::standard();
        let land = model.get("land").unwrap();
        let tags = Tags::from_pairs(&[("highway", "motorway"), ("hgv", "designated")]);
        let values = model.access_values(&tags, land);
        assert_eq!(values.get("hgv").map(String::as_str), Some("designated"));
        assert_eq!(
            values.get("hgv_articulated").map(String::as_str),
            Some("designated")
        );
        assert!(!values.contains_key("highway"));
    }

    #[test]
    fn test_value_sets() {
        assert!(AccessModel::is_positive("designated"));
        assert!(AccessModel::is_positive("forestry"));
        assert!(!AccessModel::is_positive("private"));
        assert!(!AccessModel::is_positive("no"));
        assert_eq!(AccessModel::positive_values().len(), 9);
        assert_eq!(AccessModel::restriction_values().len(), 11);
    }
}

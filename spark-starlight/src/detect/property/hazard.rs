use anyhow::anyhow;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of distinct cooldown slots a kind can occupy: every named kind plus
/// one shared slot for unclassified labels.
pub const KIND_SLOTS: usize = 15;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// What the classifier (or the heuristic detector) saw.
///
/// Labels the system has no name for are kept verbatim in `Unclassified`, so a
/// newer classifier can add classes without breaking anything downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HazardKind {
    Pothole,
    Manhole,
    Gap,
    Stairs,
    Curb,
    Step,
    BrokenPavement,
    TactilePaving,
    Person,
    Bicycle,
    Car,
    Motorcycle,
    Obstacle,
    Sign,
    Unclassified(String),
}

impl HazardKind {
    pub const NAMED: [HazardKind; KIND_SLOTS - 1] = [
        HazardKind::Pothole,
        HazardKind::Manhole,
        HazardKind::Gap,
        HazardKind::Stairs,
        HazardKind::Curb,
        HazardKind::Step,
        HazardKind::BrokenPavement,
        HazardKind::TactilePaving,
        HazardKind::Person,
        HazardKind::Bicycle,
        HazardKind::Car,
        HazardKind::Motorcycle,
        HazardKind::Obstacle,
        HazardKind::Sign,
    ];

    /// Maps a classifier label onto a kind. Generic object-detector classes
    /// are folded into the hazard vocabulary (buses are vehicles, benches are
    /// obstacles, ...).
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pothole" => HazardKind::Pothole,
            "manhole" => HazardKind::Manhole,
            "gap" => HazardKind::Gap,
            "stairs" => HazardKind::Stairs,
            "curb" => HazardKind::Curb,
            "step" => HazardKind::Step,
            "broken_pavement" => HazardKind::BrokenPavement,
            "tactile_paving" => HazardKind::TactilePaving,
            "person" => HazardKind::Person,
            "bicycle" => HazardKind::Bicycle,
            "car" | "bus" | "truck" => HazardKind::Car,
            "motorcycle" => HazardKind::Motorcycle,
            "obstacle" | "chair" | "bench" | "potted plant" | "fire hydrant" | "parking meter"
            | "backpack" | "suitcase" => HazardKind::Obstacle,
            "sign" | "stop sign" => HazardKind::Sign,
            _ => HazardKind::Unclassified(label.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HazardKind::Pothole => "pothole",
            HazardKind::Manhole => "manhole",
            HazardKind::Gap => "gap",
            HazardKind::Stairs => "stairs",
            HazardKind::Curb => "curb",
            HazardKind::Step => "step",
            HazardKind::BrokenPavement => "broken_pavement",
            HazardKind::TactilePaving => "tactile_paving",
            HazardKind::Person => "person",
            HazardKind::Bicycle => "bicycle",
            HazardKind::Car => "car",
            HazardKind::Motorcycle => "motorcycle",
            HazardKind::Obstacle => "obstacle",
            HazardKind::Sign => "sign",
            HazardKind::Unclassified(label) => label,
        }
    }

    /// How the kind is said out loud.
    pub fn spoken_label(&self) -> &str {
        match self {
            HazardKind::Manhole => "manhole cover",
            HazardKind::BrokenPavement => "broken pavement",
            HazardKind::TactilePaving => "tactile paving",
            HazardKind::Person => "pedestrian",
            HazardKind::Car => "vehicle",
            other => other.name(),
        }
    }

    /// Position in fixed-size per-kind tables. Every unclassified label shares
    /// the last slot.
    pub fn slot(&self) -> usize {
        match self {
            HazardKind::Pothole => 0,
            HazardKind::Manhole => 1,
            HazardKind::Gap => 2,
            HazardKind::Stairs => 3,
            HazardKind::Curb => 4,
            HazardKind::Step => 5,
            HazardKind::BrokenPavement => 6,
            HazardKind::TactilePaving => 7,
            HazardKind::Person => 8,
            HazardKind::Bicycle => 9,
            HazardKind::Car => 10,
            HazardKind::Motorcycle => 11,
            HazardKind::Obstacle => 12,
            HazardKind::Sign => 13,
            HazardKind::Unclassified(_) => KIND_SLOTS - 1,
        }
    }

    fn default_priority(&self) -> u8 {
        match self {
            HazardKind::Pothole | HazardKind::Manhole | HazardKind::Gap => 5,
            HazardKind::Stairs | HazardKind::Curb | HazardKind::Step => 4,
            HazardKind::BrokenPavement | HazardKind::TactilePaving | HazardKind::Car => 3,
            HazardKind::Person | HazardKind::Bicycle => 2,
            _ => MIN_PRIORITY,
        }
    }
}

impl Display for HazardKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// `kind -> priority (1..=5)` lookup.
///
/// Configured as a flat `label = priority` map; labels that do not name a
/// known kind are kept for unclassified detections with that exact label.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "HashMap<String, u8>", into = "HashMap<String, u8>")]
pub struct PriorityTable {
    named: [u8; KIND_SLOTS - 1],
    extra: HashMap<String, u8>,
    fallback: u8,
}

impl Default for PriorityTable {
    fn default() -> Self {
        let mut named = [MIN_PRIORITY; KIND_SLOTS - 1];
        for kind in HazardKind::NAMED.iter() {
            named[kind.slot()] = kind.default_priority();
        }
        Self {
            named,
            extra: HashMap::new(),
            fallback: MIN_PRIORITY,
        }
    }
}

impl PriorityTable {
    pub fn priority(&self, kind: &HazardKind) -> u8 {
        match kind {
            HazardKind::Unclassified(label) => {
                self.extra.get(label.as_str()).copied().unwrap_or(self.fallback)
            }
            named => self.named[named.slot()],
        }
    }

    pub fn set(&mut self, label: &str, priority: u8) -> anyhow::Result<()> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(anyhow!(
                "priority for '{}' must be within {}..={}, got {}",
                label,
                MIN_PRIORITY,
                MAX_PRIORITY,
                priority
            ));
        }
        if label == "default" {
            self.fallback = priority;
            return Ok(());
        }
        match HazardKind::from_label(label) {
            HazardKind::Unclassified(label) => {
                self.extra.insert(label, priority);
            }
            named => self.named[named.slot()] = priority,
        }
        Ok(())
    }
}

impl TryFrom<HashMap<String, u8>> for PriorityTable {
    type Error = anyhow::Error;

    /// Aliases of one kind (`car`, `truck`) may repeat a priority but not
    /// disagree on it.
    fn try_from(overrides: HashMap<String, u8>) -> Result<Self, Self::Error> {
        let mut table = PriorityTable::default();
        let mut claimed: [Option<(&str, u8)>; KIND_SLOTS - 1] = [None; KIND_SLOTS - 1];
        for (label, priority) in overrides.iter() {
            let kind = HazardKind::from_label(label);
            if !matches!(kind, HazardKind::Unclassified(_)) {
                let slot = &mut claimed[kind.slot()];
                match *slot {
                    Some((other, earlier)) if earlier != *priority => {
                        return Err(anyhow!(
                            "'{}' = {} conflicts with '{}' = {}, both set the priority of {}",
                            label,
                            priority,
                            other,
                            earlier,
                            kind
                        ));
                    }
                    _ => *slot = Some((label.as_str(), *priority)),
                }
            }
            table.set(label, *priority)?;
        }
        Ok(table)
    }
}

impl From<PriorityTable> for HashMap<String, u8> {
    fn from(table: PriorityTable) -> Self {
        let mut map: HashMap<String, u8> = HazardKind::NAMED
            .iter()
            .map(|kind| (kind.name().to_string(), table.named[kind.slot()]))
            .collect();
        map.extend(table.extra);
        map.insert("default".to_string(), table.fallback);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_labels_fold_into_hazard_kinds() {
        assert_eq!(HazardKind::from_label("truck"), HazardKind::Car);
        assert_eq!(HazardKind::from_label("fire hydrant"), HazardKind::Obstacle);
        assert_eq!(HazardKind::from_label("stop sign"), HazardKind::Sign);
        assert_eq!(
            HazardKind::from_label("scooter"),
            HazardKind::Unclassified("scooter".into())
        );
    }

    #[test]
    fn default_priorities() {
        let table = PriorityTable::default();
        assert_eq!(table.priority(&HazardKind::Pothole), 5);
        assert_eq!(table.priority(&HazardKind::Curb), 4);
        assert_eq!(table.priority(&HazardKind::Car), 3);
        assert_eq!(table.priority(&HazardKind::Person), 2);
        assert_eq!(table.priority(&HazardKind::Obstacle), 1);
        assert_eq!(table.priority(&HazardKind::Unclassified("kite".into())), 1);
    }

    #[test]
    fn overrides_cover_named_and_unknown_labels() -> anyhow::Result<()> {
        let mut overrides = HashMap::new();
        overrides.insert("person".to_string(), 3);
        overrides.insert("scooter".to_string(), 4);
        let table = PriorityTable::try_from(overrides)?;
        assert_eq!(table.priority(&HazardKind::Person), 3);
        assert_eq!(table.priority(&HazardKind::Unclassified("scooter".into())), 4);
        assert_eq!(table.priority(&HazardKind::Unclassified("kite".into())), 1);
        Ok(())
    }

    #[test]
    fn conflicting_aliases_are_rejected() -> anyhow::Result<()> {
        let mut overrides = HashMap::new();
        overrides.insert("car".to_string(), 2);
        overrides.insert("truck".to_string(), 4);
        assert!(PriorityTable::try_from(overrides.clone()).is_err());

        overrides.insert("truck".to_string(), 2);
        let table = PriorityTable::try_from(overrides)?;
        assert_eq!(table.priority(&HazardKind::Car), 2);
        Ok(())
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let mut table = PriorityTable::default();
        assert!(table.set("pothole", 6).is_err());
        assert!(table.set("pothole", 0).is_err());
    }

    #[test]
    fn every_named_kind_has_a_distinct_slot() {
        let mut seen = [false; KIND_SLOTS];
        for kind in HazardKind::NAMED.iter() {
            assert!(!seen[kind.slot()]);
            seen[kind.slot()] = true;
        }
        assert!(!seen[KIND_SLOTS - 1]);
    }
}

use crate::detect::edge::EdgeSide;
use crate::detect::property::direction::{DirectionCategory, DIRECTION_SLOTS};
use crate::detect::property::hazard::{HazardKind, KIND_SLOTS};
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const HAZARD_KEYS: usize = KIND_SLOTS * DIRECTION_SLOTS;
/// Every hazard `(kind, direction)` pair, both edge sides and "path clear".
pub const KEY_COUNT: usize = HAZARD_KEYS + 3;

/// Something that can be announced and is rate-limited on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AnnouncementKey {
    Hazard {
        kind_slot: usize,
        direction: DirectionCategory,
    },
    EdgeLeft,
    EdgeRight,
    PathClear,
}

impl AnnouncementKey {
    /// All unclassified kinds share one key per direction.
    pub fn hazard(kind: &HazardKind, direction: DirectionCategory) -> Self {
        AnnouncementKey::Hazard {
            kind_slot: kind.slot(),
            direction,
        }
    }

    pub fn edge(side: EdgeSide) -> Self {
        match side {
            EdgeSide::Left => AnnouncementKey::EdgeLeft,
            EdgeSide::Right => AnnouncementKey::EdgeRight,
        }
    }

    fn index(&self) -> usize {
        match self {
            AnnouncementKey::Hazard {
                kind_slot,
                direction,
            } => kind_slot * DIRECTION_SLOTS + direction.slot(),
            AnnouncementKey::EdgeLeft => HAZARD_KEYS,
            AnnouncementKey::EdgeRight => HAZARD_KEYS + 1,
            AnnouncementKey::PathClear => HAZARD_KEYS + 2,
        }
    }
}

impl Display for AnnouncementKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnouncementKey::Hazard {
                kind_slot,
                direction,
            } => match HazardKind::NAMED.get(*kind_slot) {
                Some(kind) => write!(f, "{}/{}", kind, direction),
                None => write!(f, "unclassified/{}", direction),
            },
            AnnouncementKey::EdgeLeft => write!(f, "edge_left"),
            AnnouncementKey::EdgeRight => write!(f, "edge_right"),
            AnnouncementKey::PathClear => write!(f, "path_clear"),
        }
    }
}

/// Last emission time of every announcement key. Fixed size: one entry per
/// possible key, so it never grows with what the classifier reports.
#[derive(Debug, Clone)]
pub struct CooldownTable {
    last_fired: [Option<Instant>; KEY_COUNT],
}

impl Default for CooldownTable {
    fn default() -> Self {
        Self {
            last_fired: [None; KEY_COUNT],
        }
    }
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_fired(&self, key: AnnouncementKey) -> Option<Instant> {
        self.last_fired[key.index()]
    }

    /// A key that never fired is always ready.
    pub fn ready(&self, key: AnnouncementKey, now: Instant, cooldown: Duration) -> bool {
        match self.last_fired(key) {
            Some(last) => now.saturating_duration_since(last) >= cooldown,
            None => true,
        }
    }

    pub fn mark(&mut self, key: AnnouncementKey, now: Instant) {
        self.last_fired[key.index()] = Some(now);
    }

    /// Marks the key and returns true when it is ready, otherwise leaves the
    /// table untouched.
    pub fn try_fire(&mut self, key: AnnouncementKey, now: Instant, cooldown: Duration) -> bool {
        if !self.ready(key, now, cooldown) {
            return false;
        }
        self.mark(key, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_its_own_index() {
        let mut keys = Vec::new();
        for kind in HazardKind::NAMED.iter().chain([&HazardKind::Unclassified("kite".into())]) {
            for direction in [
                DirectionCategory::Center,
                DirectionCategory::Left,
                DirectionCategory::Right,
                DirectionCategory::FarLeft,
                DirectionCategory::FarRight,
            ] {
                keys.push(AnnouncementKey::hazard(kind, direction).index());
            }
        }
        keys.extend([
            AnnouncementKey::EdgeLeft.index(),
            AnnouncementKey::EdgeRight.index(),
            AnnouncementKey::PathClear.index(),
        ]);
        keys.sort_unstable();
        assert_eq!(keys, (0..KEY_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn unclassified_labels_share_a_key() {
        assert_eq!(
            AnnouncementKey::hazard(&HazardKind::Unclassified("kite".into()), DirectionCategory::Left),
            AnnouncementKey::hazard(&HazardKind::Unclassified("drone".into()), DirectionCategory::Left),
        );
    }

    #[test]
    fn cooldown_gates_each_key_separately() {
        let start = Instant::now();
        let cooldown = Duration::from_secs(3);
        let mut table = CooldownTable::new();
        let pothole = AnnouncementKey::hazard(&HazardKind::Pothole, DirectionCategory::Center);

        assert!(table.try_fire(pothole, start, cooldown));
        assert!(!table.try_fire(pothole, start + Duration::from_secs(2), cooldown));
        assert_eq!(table.last_fired(pothole), Some(start));
        assert!(table.try_fire(AnnouncementKey::EdgeLeft, start, cooldown));
        assert!(table.try_fire(pothole, start + cooldown, cooldown));
    }
}

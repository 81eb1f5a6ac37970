//! Property flag bitmasks (§3). Modeled with `bitflags!`, the way the
//! rest of the pack represents flag sets rather than raw integers.

bitflags::bitflags! {
    /// v2 property flags.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PropertyFlags: u32 {
        /// Property can be read.
        const READ = 1 << 0;
        /// Property can be written.
        const WRITE = 1 << 1;
        /// Bump to force re-propagation even if the value is unchanged.
        const SERIAL = 1 << 2;
    }
}

bitflags::bitflags! {
    /// v0 property flags. Superset of [`PropertyFlags`]: v0 additionally
    /// folded the Choice discipline into the flags themselves.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LegacyPropertyFlags: u32 {
        /// Property can be read.
        const READ = 1 << 0;
        /// Property can be written.
        const WRITE = 1 << 1;
        /// Bump to force re-propagation.
        const SERIAL = 1 << 2;
        /// The value carries a Choice discipline (range/step/enum/flags);
        /// absent means plain value regardless of declared range bits.
        const UNSET = 1 << 3;
        /// Property may be absent.
        const OPTIONAL = 1 << 4;
        /// Property cannot be written by the peer.
        const READONLY = 1 << 5;
        /// Property is deprecated.
        const DEPRECATED = 1 << 6;
        /// Property is informational only.
        const INFO = 1 << 7;

        /// Range-type sub-field: no constraint.
        const RANGE_NONE = 0;
        /// Range-type sub-field: `[default, min, max]`.
        const RANGE_MIN_MAX = 1 << 8;
        /// Range-type sub-field: `[default, min, max, step]`.
        const RANGE_STEP = 1 << 9;
        /// Range-type sub-field: `[default, alt1, alt2, ...]`.
        const RANGE_ENUM = 1 << 10;
        /// Range-type sub-field: `[default, mask1, mask2, ...]`.
        const RANGE_FLAGS = 1 << 11;
    }
}

impl From<PropertyFlags> for LegacyPropertyFlags {
    fn from(v2: PropertyFlags) -> Self {
        let mut out = Self::empty();
        out.set(Self::READ, v2.contains(PropertyFlags::READ));
        out.set(Self::WRITE, v2.contains(PropertyFlags::WRITE));
        out.set(Self::SERIAL, v2.contains(PropertyFlags::SERIAL));
        out
    }
}

impl From<LegacyPropertyFlags> for PropertyFlags {
    fn from(v0: LegacyPropertyFlags) -> Self {
        let mut out = Self::empty();
        out.set(Self::READ, v0.contains(LegacyPropertyFlags::READ));
        out.set(Self::WRITE, v0.contains(LegacyPropertyFlags::WRITE));
        out.set(Self::SERIAL, v0.contains(LegacyPropertyFlags::SERIAL));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_to_v2_drops_discipline_bits() {
        let legacy = LegacyPropertyFlags::READ
            | LegacyPropertyFlags::WRITE
            | LegacyPropertyFlags::UNSET
            | LegacyPropertyFlags::RANGE_MIN_MAX;
        let v2: PropertyFlags = legacy.into();
        assert_eq!(v2, PropertyFlags::READ | PropertyFlags::WRITE);
    }

    #[test]
    fn v2_round_trips_through_legacy_for_the_shared_bits() {
        let v2 = PropertyFlags::READ | PropertyFlags::SERIAL;
        let legacy: LegacyPropertyFlags = v2.into();
        let back: PropertyFlags = legacy.into();
        assert_eq!(v2, back);
    }
}

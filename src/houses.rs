/// The three Houses. This set is closed: every output structure carries an
/// entry for each of them, even when the store has no matching rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HouseKey {
    Prisma,
    Macondo,
    Marmoris,
}

impl HouseKey {
    pub const ALL: [HouseKey; 3] = [HouseKey::Prisma, HouseKey::Macondo, HouseKey::Marmoris];

    /// Maps the store's unit label to the canonical key. Labels outside this
    /// table are ignored by callers, not treated as errors.
    pub fn from_unit_label(label: &str) -> Option<HouseKey> {
        match label {
            "Prisma" => Some(HouseKey::Prisma),
            "Macondo" => Some(HouseKey::Macondo),
            "Marmoris" => Some(HouseKey::Marmoris),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HouseKey::Prisma => "prisma",
            HouseKey::Macondo => "macondo",
            HouseKey::Marmoris => "marmoris",
        }
    }
}

/// Static identity of a House. Configuration data, not behavior.
#[derive(Debug, Clone, Copy)]
pub struct HouseInfo {
    pub name: &'static str,
    pub leader: &'static str,
    pub sensibility: &'static str,
    pub motto: &'static str,
}

pub fn house_info(key: HouseKey) -> HouseInfo {
    match key {
        HouseKey::Prisma => HouseInfo {
            name: "Prisma",
            leader: "Diogo",
            sensibility: "TCC e Comportamentais",
            motto: "Decompor a complexidade em clareza",
        },
        HouseKey::Macondo => HouseInfo {
            name: "Macondo",
            leader: "Flávia",
            sensibility: "Psicodinâmica",
            motto: "A magia habita a realidade",
        },
        HouseKey::Marmoris => HouseInfo {
            name: "Marmoris",
            leader: "Alice Guedon",
            sensibility: "Humanista",
            motto: "O brilho do sol refletido no mar",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_labels_map_to_keys() {
        assert_eq!(HouseKey::from_unit_label("Prisma"), Some(HouseKey::Prisma));
        assert_eq!(HouseKey::from_unit_label("Macondo"), Some(HouseKey::Macondo));
        assert_eq!(HouseKey::from_unit_label("Marmoris"), Some(HouseKey::Marmoris));
    }

    #[test]
    fn unknown_labels_are_ignored() {
        assert_eq!(HouseKey::from_unit_label("Hufflepuff"), None);
        assert_eq!(HouseKey::from_unit_label("prisma"), None);
        assert_eq!(HouseKey::from_unit_label(""), None);
    }

    #[test]
    fn every_house_has_static_info() {
        for key in HouseKey::ALL {
            let info = house_info(key);
            assert!(!info.name.is_empty());
            assert!(!info.leader.is_empty());
            assert!(!info.motto.is_empty());
        }
    }
}

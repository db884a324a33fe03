/// Shop catalog. Static mock data; nothing here is purchasable yet.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u32,
    pub rarity: Rarity,
    pub expires_in_hours: u32,
}

pub const CATALOG: &[ShopItem] = &[
    ShopItem { id: "abacus-hat", name: "Abacus Hat", price: 120, rarity: Rarity::Common, expires_in_hours: 48 },
    ShopItem { id: "fraction-cape", name: "Fraction Cape", price: 300, rarity: Rarity::Rare, expires_in_hours: 24 },
    ShopItem { id: "prime-boots", name: "Prime Boots", price: 450, rarity: Rarity::Rare, expires_in_hours: 72 },
    ShopItem { id: "infinity-wand", name: "Infinity Wand", price: 900, rarity: Rarity::Epic, expires_in_hours: 12 },
    ShopItem { id: "golden-ratio", name: "Golden Ratio Crown", price: 1618, rarity: Rarity::Legendary, expires_in_hours: 6 },
];

/// "2d 4h" style countdown.
pub fn format_expiry(hours: u32) -> String {
    match (hours / 24, hours % 24) {
        (0, h) => format!("{}h", h),
        (d, 0) => format!("{}d", d),
        (d, h) => format!("{}d {}h", d, h),
    }
}

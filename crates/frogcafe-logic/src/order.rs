//! Drink orders and the player's held drink.
//!
//! An [`Order`] is what a customer requires; a [`HeldDrink`] is what the
//! player has assembled so far. Serving succeeds only on an exact field-wise
//! match.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::OrderChances;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CupType {
    Mug,
    Glass,
}

impl CupType {
    pub fn name(&self) -> &'static str {
        match self {
            CupType::Mug => "Mug",
            CupType::Glass => "Glass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TeaType {
    #[default]
    Empty,
    Red,
    Green,
    Black,
    Blue,
}

impl TeaType {
    pub const COLORS: [TeaType; 4] = [TeaType::Red, TeaType::Green, TeaType::Black, TeaType::Blue];

    pub fn name(&self) -> &'static str {
        match self {
            TeaType::Empty => "Empty",
            TeaType::Red => "Red",
            TeaType::Green => "Green",
            TeaType::Black => "Black",
            TeaType::Blue => "Blue",
        }
    }
}

/// The exact drink a customer wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub cup: CupType,
    pub tea: TeaType,
    pub milk: bool,
    pub honey: bool,
    pub ice: bool,
}

impl Order {
    pub fn new(cup: CupType, tea: TeaType) -> Self {
        Self {
            cup,
            tea,
            milk: false,
            honey: false,
            ice: false,
        }
    }

    pub fn with_milk(mut self) -> Self {
        self.milk = true;
        self
    }

    pub fn with_honey(mut self) -> Self {
        self.honey = true;
        self
    }

    pub fn with_ice(mut self) -> Self {
        self.ice = true;
        self
    }

    /// Roll a random order.
    ///
    /// Cup is a coin flip, tea is one of the four colors, ice is only rolled
    /// for glasses, and an iced order never has milk.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, chances: &OrderChances) -> Self {
        let cup = if rng.gen_bool(0.5) {
            CupType::Mug
        } else {
            CupType::Glass
        };
        let tea = TeaType::COLORS[rng.gen_range(0..TeaType::COLORS.len())];
        let mut milk = rng.gen::<f32>() < chances.milk_chance;
        let honey = rng.gen::<f32>() < chances.honey_chance;
        let ice = cup == CupType::Glass && rng.gen::<f32>() < chances.ice_chance;
        if ice && milk {
            milk = false;
        }
        Self {
            cup,
            tea,
            milk,
            honey,
            ice,
        }
    }

    /// Exact field-wise comparison; there is no partial credit.
    pub fn matches(&self, other: &Order) -> bool {
        self == other
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cup.name())?;
        if self.tea != TeaType::Empty {
            write!(f, " {}", self.tea.name())?;
        }
        if self.milk {
            write!(f, " + Milk")?;
        }
        if self.honey {
            write!(f, " + Honey")?;
        }
        if self.ice {
            write!(f, " + Ice")?;
        }
        Ok(())
    }
}

/// Something the player can add to the drink in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ingredient {
    Cup(CupType),
    Tea(TeaType),
    HotWater,
    ColdWater,
    Milk,
    Honey,
    Ice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum Fill {
    #[default]
    Empty,
    HotWater,
    ColdWater,
    Tea,
}

/// Drink being assembled by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeldDrink {
    cup: Option<CupType>,
    fill: Fill,
    tea: TeaType,
    milk: bool,
    honey: bool,
    ice: bool,
}

impl HeldDrink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an ingredient. Returns false (and changes nothing) if it doesn't fit.
    pub fn add(&mut self, ingredient: Ingredient) -> bool {
        match ingredient {
            Ingredient::Cup(cup) => {
                if self.cup.is_some() {
                    return false;
                }
                self.cup = Some(cup);
            }
            Ingredient::Tea(tea) => {
                if self.cup.is_none() || tea == TeaType::Empty {
                    return false;
                }
                self.fill = Fill::Tea;
                self.tea = tea;
            }
            Ingredient::HotWater => {
                if self.cup != Some(CupType::Mug) || self.fill != Fill::Empty {
                    return false;
                }
                self.fill = Fill::HotWater;
                self.tea = TeaType::Black;
            }
            Ingredient::ColdWater => {
                if self.cup != Some(CupType::Glass) || self.fill != Fill::Empty {
                    return false;
                }
                self.fill = Fill::ColdWater;
                self.tea = TeaType::Green;
            }
            Ingredient::Milk => {
                if self.fill != Fill::Tea {
                    return false;
                }
                self.milk = true;
            }
            Ingredient::Honey => {
                if self.fill != Fill::Tea {
                    return false;
                }
                self.honey = true;
            }
            Ingredient::Ice => {
                if self.cup != Some(CupType::Glass) {
                    return false;
                }
                self.ice = true;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.cup.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The drink as an order, once a cup is held.
    pub fn as_order(&self) -> Option<Order> {
        self.cup.map(|cup| Order {
            cup,
            tea: self.tea,
            milk: self.milk,
            honey: self.honey,
            ice: self.ice,
        })
    }

    /// Build the drink that satisfies `order`.
    pub fn prepared_for(order: &Order) -> Self {
        let mut drink = Self::new();
        drink.add(Ingredient::Cup(order.cup));
        if order.tea != TeaType::Empty {
            drink.add(Ingredient::Tea(order.tea));
        }
        if order.ice {
            drink.add(Ingredient::Ice);
        }
        if order.honey {
            drink.add(Ingredient::Honey);
        }
        if order.milk {
            drink.add(Ingredient::Milk);
        }
        drink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_display() {
        let order = Order::new(CupType::Glass, TeaType::Green)
            .with_honey()
            .with_ice();
        assert_eq!(order.to_string(), "Glass Green + Honey + Ice");
        assert_eq!(Order::new(CupType::Mug, TeaType::Empty).to_string(), "Mug");
    }

    #[test]
    fn test_matches_is_exact() {
        let a = Order::new(CupType::Mug, TeaType::Red).with_milk();
        let b = Order::new(CupType::Mug, TeaType::Red);
        assert!(a.matches(&a));
        assert!(!a.matches(&b));
        assert!(!b.matches(&Order::new(CupType::Glass, TeaType::Red)));
    }

    #[test]
    fn test_random_orders_respect_rules() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let chances = OrderChances {
            milk_chance: 0.9,
            honey_chance: 0.5,
            ice_chance: 0.9,
        };
        for _ in 0..500 {
            let order = Order::random(&mut rng, &chances);
            assert_ne!(order.tea, TeaType::Empty);
            if order.ice {
                assert_eq!(order.cup, CupType::Glass);
                assert!(!order.milk);
            }
        }
    }

    #[test]
    fn test_held_drink_requires_cup_first() {
        let mut drink = HeldDrink::new();
        assert!(!drink.add(Ingredient::Tea(TeaType::Red)));
        assert!(!drink.add(Ingredient::Milk));
        assert!(drink.as_order().is_none());

        assert!(drink.add(Ingredient::Cup(CupType::Mug)));
        assert!(!drink.add(Ingredient::Cup(CupType::Glass)));
        assert!(!drink.add(Ingredient::Milk)); // no tea yet
        assert!(drink.add(Ingredient::Tea(TeaType::Red)));
        assert!(drink.add(Ingredient::Milk));
        assert!(!drink.add(Ingredient::Ice)); // mugs don't take ice

        assert_eq!(
            drink.as_order(),
            Some(Order::new(CupType::Mug, TeaType::Red).with_milk())
        );
    }

    #[test]
    fn test_water_defaults() {
        let mut mug = HeldDrink::new();
        mug.add(Ingredient::Cup(CupType::Mug));
        assert!(!mug.add(Ingredient::ColdWater));
        assert!(mug.add(Ingredient::HotWater));
        assert!(!mug.add(Ingredient::HotWater));
        assert_eq!(mug.as_order().map(|o| o.tea), Some(TeaType::Black));

        let mut glass = HeldDrink::new();
        glass.add(Ingredient::Cup(CupType::Glass));
        assert!(glass.add(Ingredient::ColdWater));
        assert_eq!(glass.as_order().map(|o| o.tea), Some(TeaType::Green));
        // honey needs brewed tea, not plain water
        assert!(!glass.add(Ingredient::Honey));
    }

    #[test]
    fn test_prepared_for_matches_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let chances = OrderChances::default();
        for _ in 0..100 {
            let order = Order::random(&mut rng, &chances);
            let drink = HeldDrink::prepared_for(&order);
            assert_eq!(drink.as_order(), Some(order));
        }
    }

    #[test]
    fn test_clear() {
        let mut drink = HeldDrink::prepared_for(&Order::new(CupType::Glass, TeaType::Blue));
        assert!(!drink.is_empty());
        drink.clear();
        assert!(drink.is_empty());
    }
}

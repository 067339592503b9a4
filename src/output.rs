use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Raw plot yield: food, production (hammers) and undifferentiated commerce.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct PlotYield {
    pub food: i32,
    pub production: i32,
    pub commerce: i32,
}

impl PlotYield {
    pub const fn new(food: i32, production: i32, commerce: i32) -> Self {
        PlotYield {
            food,
            production,
            commerce,
        }
    }

    pub fn total(self) -> i32 {
        self.food + self.production + self.commerce
    }

    pub fn is_zero(self) -> bool {
        self == PlotYield::default()
    }

    /// Apply a percentage modifier triple (100 = unmodified).
    pub fn modified(self, modifier: PlotYield) -> Self {
        PlotYield {
            food: self.food * (100 + modifier.food) / 100,
            production: self.production * (100 + modifier.production) / 100,
            commerce: self.commerce * (100 + modifier.commerce) / 100,
        }
    }
}

impl Add for PlotYield {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        PlotYield {
            food: self.food + rhs.food,
            production: self.production + rhs.production,
            commerce: self.commerce + rhs.commerce,
        }
    }
}

impl AddAssign for PlotYield {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for PlotYield {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        PlotYield {
            food: self.food - rhs.food,
            production: self.production - rhs.production,
            commerce: self.commerce - rhs.commerce,
        }
    }
}

/// The commerce channels a city's raw commerce is split into.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum CommerceKind {
    Gold,
    Research,
    Culture,
}

/// Split commerce plus flat per-turn amounts from buildings and specialists.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Commerce {
    pub gold: i32,
    pub research: i32,
    pub culture: i32,
}

impl Commerce {
    pub const fn new(gold: i32, research: i32, culture: i32) -> Self {
        Commerce {
            gold,
            research,
            culture,
        }
    }

    pub fn get(self, kind: CommerceKind) -> i32 {
        match kind {
            CommerceKind::Gold => self.gold,
            CommerceKind::Research => self.research,
            CommerceKind::Culture => self.culture,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Commerce::default()
    }
}

impl Add for Commerce {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Commerce {
            gold: self.gold + rhs.gold,
            research: self.research + rhs.research,
            culture: self.culture + rhs.culture,
        }
    }
}

impl AddAssign for Commerce {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Commerce {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Commerce {
            gold: self.gold - rhs.gold,
            research: self.research - rhs.research,
            culture: self.culture - rhs.culture,
        }
    }
}

/// The per-output-type dimensions the optimiser and tactics layer rank on.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum OutputKind {
    Food,
    Production,
    Gold,
    Research,
    Culture,
    GreatPeople,
}

pub const OUTPUT_KINDS: [OutputKind; 6] = [
    OutputKind::Food,
    OutputKind::Production,
    OutputKind::Gold,
    OutputKind::Research,
    OutputKind::Culture,
    OutputKind::GreatPeople,
];

/// A city's full per-turn output after modifiers and commerce splitting.
#[derive(Copy, Clone, Default, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CityOutput {
    pub food: i32,
    pub production: i32,
    pub gold: i32,
    pub research: i32,
    pub culture: i32,
    pub gpp: i32,
}

impl CityOutput {
    pub fn get(self, kind: OutputKind) -> i32 {
        match kind {
            OutputKind::Food => self.food,
            OutputKind::Production => self.production,
            OutputKind::Gold => self.gold,
            OutputKind::Research => self.research,
            OutputKind::Culture => self.culture,
            OutputKind::GreatPeople => self.gpp,
        }
    }

    /// Weighted value used for comparative ranking.
    pub fn weighted(self, weights: &OutputWeights) -> i64 {
        OUTPUT_KINDS
            .iter()
            .map(|&kind| self.get(kind) as i64 * weights.get(kind) as i64)
            .sum()
    }
}

impl Add for CityOutput {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        CityOutput {
            food: self.food + rhs.food,
            production: self.production + rhs.production,
            gold: self.gold + rhs.gold,
            research: self.research + rhs.research,
            culture: self.culture + rhs.culture,
            gpp: self.gpp + rhs.gpp,
        }
    }
}

impl AddAssign for CityOutput {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for CityOutput {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        CityOutput {
            food: self.food - rhs.food,
            production: self.production - rhs.production,
            gold: self.gold - rhs.gold,
            research: self.research - rhs.research,
            culture: self.culture - rhs.culture,
            gpp: self.gpp - rhs.gpp,
        }
    }
}

/// Per-output weights for the optimiser's multi-objective value function.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct OutputWeights {
    pub food: i32,
    pub production: i32,
    pub gold: i32,
    pub research: i32,
    pub culture: i32,
    pub gpp: i32,
}

impl OutputWeights {
    pub fn get(&self, kind: OutputKind) -> i32 {
        match kind {
            OutputKind::Food => self.food,
            OutputKind::Production => self.production,
            OutputKind::Gold => self.gold,
            OutputKind::Research => self.research,
            OutputKind::Culture => self.culture,
            OutputKind::GreatPeople => self.gpp,
        }
    }

    /// Balanced default used outside of tactic-specific optimisation passes.
    pub fn standard() -> Self {
        OutputWeights {
            food: 4,
            production: 3,
            gold: 2,
            research: 2,
            culture: 1,
            gpp: 1,
        }
    }

    pub fn emphasise(mut self, kind: OutputKind, weight: i32) -> Self {
        match kind {
            OutputKind::Food => self.food = weight,
            OutputKind::Production => self.production = weight,
            OutputKind::Gold => self.gold = weight,
            OutputKind::Research => self.research = weight,
            OutputKind::Culture => self.culture = weight,
            OutputKind::GreatPeople => self.gpp = weight,
        }
        self
    }
}

impl Default for OutputWeights {
    fn default() -> Self {
        Self::standard()
    }
}

//! Construction candidates and their capability flags.
//!
//! A [`ConstructItem`] targets exactly one buildable entity; the tagged
//! [`Buildable`] union makes a multi-target item unrepresentable. Flags are
//! derived mechanically from the entity's info tree, and merging two items
//! for the same target unions their capabilities.

use crate::error::{AdvisorError, Result};
use crate::info::InfoNode;
use crate::output::CommerceKind;
use crate::rules::*;
use bitflags::bitflags;

bitflags! {
    /// Economic concerns a candidate can serve.
    #[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
    pub struct EconomicFlags: u32 {
        const FOOD = 1 << 0;
        const PRODUCTION = 1 << 1;
        const GOLD = 1 << 2;
        const RESEARCH = 1 << 3;
        const CULTURE = 1 << 4;
        const HAPPY = 1 << 5;
        const HEALTH = 1 << 6;
        /// Relieves maintenance costs.
        const MAINTENANCE = 1 << 7;
        const GREAT_PEOPLE = 1 << 8;
        const SPECIALISTS = 1 << 9;
    }
}

bitflags! {
    #[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
    pub struct MilitaryFlags: u32 {
        const ATTACK = 1 << 0;
        const DEFENCE = 1 << 1;
    }
}

bitflags! {
    #[derive(Copy, Clone, Default, Eq, PartialEq, Debug)]
    pub struct VictoryFlags: u32 {
        const BUILDING = 1 << 0;
        const PROJECT = 1 << 1;
    }
}

/// The one thing a construct item proposes to build.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Buildable {
    Building(BuildingType),
    Unit(UnitType),
    Project(ProjectType),
    Improvement(ImprovementType),
    Process(ProcessType),
}

#[derive(Clone, Debug)]
pub struct ConstructItem {
    pub buildable: Buildable,
    pub economic: EconomicFlags,
    pub military: MilitaryFlags,
    pub victory: VictoryFlags,
    /// Techs still needed before the target is available, in discovery
    /// order.
    pub required_techs: Vec<TechType>,
}

impl ConstructItem {
    pub fn new(buildable: Buildable) -> ConstructItem {
        ConstructItem {
            buildable,
            economic: EconomicFlags::empty(),
            military: MilitaryFlags::empty(),
            victory: VictoryFlags::empty(),
            required_techs: Vec::new(),
        }
    }

    /// Derive an item's flags from the entity's info tree.
    pub fn from_info(buildable: Buildable, info: &InfoNode) -> ConstructItem {
        let mut item = ConstructItem::new(buildable);
        info.fold((), &mut |(), node| item.absorb(node));
        item
    }

    fn absorb(&mut self, node: &InfoNode) {
        match node {
            InfoNode::All(_) => {}
            InfoNode::Yield(y) | InfoNode::YieldModifier(y) | InfoNode::BonusYield(_, y) => {
                if y.food > 0 {
                    self.economic |= EconomicFlags::FOOD;
                }
                if y.production > 0 {
                    self.economic |= EconomicFlags::PRODUCTION;
                }
                if y.commerce > 0 {
                    self.economic |= EconomicFlags::GOLD;
                }
            }
            InfoNode::Commerce(c) | InfoNode::CommerceModifier(c) => {
                if c.gold > 0 {
                    self.economic |= EconomicFlags::GOLD;
                }
                if c.research > 0 {
                    self.economic |= EconomicFlags::RESEARCH;
                }
                if c.culture > 0 {
                    self.economic |= EconomicFlags::CULTURE;
                }
            }
            InfoNode::Happy(n) if *n > 0 => self.economic |= EconomicFlags::HAPPY,
            InfoNode::Health(n) if *n > 0 => self.economic |= EconomicFlags::HEALTH,
            InfoNode::Maintenance(n) if *n < 0 => self.economic |= EconomicFlags::MAINTENANCE,
            InfoNode::GreatPersonPoints(n) if *n > 0 => {
                self.economic |= EconomicFlags::GREAT_PEOPLE
            }
            InfoNode::SpecialistSlot(_) => self.economic |= EconomicFlags::SPECIALISTS,
            InfoNode::Conversion(kind, _) => {
                self.economic |= match kind {
                    CommerceKind::Gold => EconomicFlags::GOLD,
                    CommerceKind::Research => EconomicFlags::RESEARCH,
                    CommerceKind::Culture => EconomicFlags::CULTURE,
                };
            }
            InfoNode::Combat(n) if *n > 0 => {
                self.military |= MilitaryFlags::ATTACK | MilitaryFlags::DEFENCE;
            }
            InfoNode::Victory => {
                self.victory |= match self.buildable {
                    Buildable::Project(_) => VictoryFlags::PROJECT,
                    _ => VictoryFlags::BUILDING,
                };
            }
            InfoNode::RequiresTech(tech) => {
                if !self.required_techs.contains(tech) {
                    self.required_techs.push(*tech);
                }
            }
            _ => {}
        }
    }

    /// Union another item's capabilities into this one. The targets must
    /// agree; a mismatch means two entities were conflated upstream.
    pub fn merge(&mut self, other: &ConstructItem) -> Result<()> {
        if self.buildable != other.buildable {
            return Err(AdvisorError::MergeTargetMismatch);
        }
        self.economic |= other.economic;
        self.military |= other.military;
        self.victory |= other.victory;
        for tech in &other.required_techs {
            if !self.required_techs.contains(tech) {
                self.required_techs.push(*tech);
            }
        }
        Ok(())
    }
}

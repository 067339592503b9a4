//! Requirement/effect trees over the rule tables.
//!
//! Each buildable entity is rendered into an [`InfoNode`] tree describing
//! what it needs and what it does; the tactics layer folds the trees into
//! flag sets and tech lists instead of re-reading the raw defs. Builders
//! here only describe, they never rank.

use crate::output::{Commerce, PlotYield};
use crate::rules::*;

/// One node of an entity's requirement/effect tree.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoNode {
    /// Grouping node; an entity's tree is `All` at the root.
    All(Vec<InfoNode>),
    /// Flat yield added to the city.
    Yield(PlotYield),
    /// Percentage yield modifiers.
    YieldModifier(PlotYield),
    Commerce(Commerce),
    CommerceModifier(Commerce),
    Happy(i32),
    Health(i32),
    /// Percentage change to maintenance, negative = relief.
    Maintenance(i32),
    GreatPersonPoints(i32),
    SpecialistSlot(SpecialistType),
    /// Effect conditional on a worked plot carrying the bonus.
    BonusYield(BonusType, PlotYield),
    /// Production-to-commerce conversion at a percentage rate.
    Conversion(crate::output::CommerceKind, i32),
    Combat(i32),
    Victory,
    RequiresTech(TechType),
    RequiresBuilding(BuildingType),
    RequiresBonus(BonusType),
    RequiresProject(ProjectType),
}

impl InfoNode {
    /// Depth-first fold over the tree.
    pub fn fold<T>(&self, acc: T, f: &mut impl FnMut(T, &InfoNode) -> T) -> T {
        let acc = f(acc, self);
        match self {
            InfoNode::All(children) => children.iter().fold(acc, |acc, c| c.fold(acc, f)),
            _ => acc,
        }
    }

    /// Every tech the tree requires, in declaration order.
    pub fn required_techs(&self) -> Vec<TechType> {
        self.fold(Vec::new(), &mut |mut techs, node| {
            if let InfoNode::RequiresTech(tech) = node {
                if !techs.contains(tech) {
                    techs.push(*tech);
                }
            }
            techs
        })
    }
}

fn push_if(nodes: &mut Vec<InfoNode>, condition: bool, node: InfoNode) {
    if condition {
        nodes.push(node);
    }
}

pub fn building_info(rules: &RuleSet, building: BuildingType) -> InfoNode {
    let def = rules.building(building);
    let mut nodes = Vec::new();

    push_if(
        &mut nodes,
        def.yield_change != PlotYield::default(),
        InfoNode::Yield(def.yield_change),
    );
    push_if(
        &mut nodes,
        def.yield_modifier != PlotYield::default(),
        InfoNode::YieldModifier(def.yield_modifier),
    );
    push_if(
        &mut nodes,
        def.commerce != Commerce::default(),
        InfoNode::Commerce(def.commerce),
    );
    push_if(
        &mut nodes,
        def.commerce_modifier != Commerce::default(),
        InfoNode::CommerceModifier(def.commerce_modifier),
    );
    push_if(&mut nodes, def.happy != 0, InfoNode::Happy(def.happy));
    push_if(&mut nodes, def.health != 0, InfoNode::Health(def.health));
    push_if(
        &mut nodes,
        def.maintenance_modifier != 0,
        InfoNode::Maintenance(def.maintenance_modifier),
    );
    push_if(&mut nodes, def.gpp != 0, InfoNode::GreatPersonPoints(def.gpp));
    for &slot in &def.specialist_slots {
        nodes.push(InfoNode::SpecialistSlot(slot));
    }
    for &(bonus, yield_) in &def.bonus_yield_changes {
        nodes.push(InfoNode::BonusYield(bonus, yield_));
    }
    push_if(&mut nodes, def.victory_building, InfoNode::Victory);
    for &tech in &def.prereq_techs {
        nodes.push(InfoNode::RequiresTech(tech));
    }
    for &prereq in &def.prereq_buildings {
        nodes.push(InfoNode::RequiresBuilding(prereq));
    }
    if let Some(bonus) = def.prereq_bonus {
        nodes.push(InfoNode::RequiresBonus(bonus));
    }

    InfoNode::All(nodes)
}

pub fn unit_info(rules: &RuleSet, unit: UnitType) -> InfoNode {
    let def = rules.unit(unit);
    let mut nodes = vec![InfoNode::Combat(def.combat)];
    for &tech in &def.prereq_techs {
        nodes.push(InfoNode::RequiresTech(tech));
    }
    if let Some(bonus) = def.prereq_bonus {
        nodes.push(InfoNode::RequiresBonus(bonus));
    }
    InfoNode::All(nodes)
}

pub fn project_info(rules: &RuleSet, project: ProjectType) -> InfoNode {
    let def = rules.project(project);
    let mut nodes = Vec::new();
    push_if(&mut nodes, def.victory_project, InfoNode::Victory);
    for &tech in &def.prereq_techs {
        nodes.push(InfoNode::RequiresTech(tech));
    }
    if let Some(prereq) = def.prereq_project {
        nodes.push(InfoNode::RequiresProject(prereq));
    }
    InfoNode::All(nodes)
}

pub fn process_info(rules: &RuleSet, process: ProcessType) -> InfoNode {
    let def = rules.process(process);
    let mut nodes = vec![InfoNode::Conversion(def.commerce_kind, def.modifier)];
    if let Some(tech) = def.prereq_tech {
        nodes.push(InfoNode::RequiresTech(tech));
    }
    InfoNode::All(nodes)
}

pub fn improvement_info(rules: &RuleSet, improvement: ImprovementType) -> InfoNode {
    let def = rules.improvement(improvement);
    let mut nodes = vec![InfoNode::Yield(def.yield_change)];
    if let Some(tech) = def.prereq_tech {
        nodes.push(InfoNode::RequiresTech(tech));
    }
    InfoNode::All(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with_building(def: BuildingDef) -> RuleSet {
        RuleSet {
            buildings: vec![def],
            ..Default::default()
        }
    }

    fn bare_building() -> BuildingDef {
        BuildingDef {
            name: "test".into(),
            cost: 60,
            commerce: Commerce::default(),
            yield_change: PlotYield::default(),
            yield_modifier: PlotYield::default(),
            commerce_modifier: Commerce::default(),
            happy: 0,
            health: 0,
            maintenance_modifier: 0,
            gpp: 0,
            specialist_slots: Vec::new(),
            prereq_techs: Vec::new(),
            prereq_buildings: Vec::new(),
            bonus_yield_changes: Vec::new(),
            prereq_bonus: None,
            max_global_instances: None,
            is_national_wonder: false,
            is_government_center: false,
            victory_building: false,
        }
    }

    #[test]
    fn zero_effects_produce_no_nodes() {
        let rules = rules_with_building(bare_building());
        assert_eq!(building_info(&rules, BuildingType(0)), InfoNode::All(vec![]));
    }

    #[test]
    fn required_techs_deduplicates_and_keeps_order() {
        let mut def = bare_building();
        def.prereq_techs = vec![TechType(3), TechType(1), TechType(3)];
        def.happy = 1;
        let rules = rules_with_building(def);
        let tree = building_info(&rules, BuildingType(0));
        assert_eq!(tree.required_techs(), vec![TechType(3), TechType(1)]);
    }
}

mod actions_test;
mod dispatch_test;
mod round_trip_test;

use scenario_tree::{ScenarioTree, TemplateCatalog, TreeBuilder, World};

pub fn build(world: &dyn World, constructions: &[&str]) -> ScenarioTree {
    TreeBuilder::new(&TemplateCatalog::with_builtins(), world)
        .build(constructions)
        .unwrap()
}

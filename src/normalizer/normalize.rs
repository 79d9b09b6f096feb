//! Normalization of the preprocessed native tree into semantic UAST.

use crate::config::NormalizerConfig;
use crate::ir::op::Mapping;
use crate::ir::ops::var;
use crate::ir::pipeline::{Pipeline, Stage};
use crate::ir::transforms::{Mappings, RolesDedup, merge_groups, move_trivias};
use crate::normalizer::semantic::normalizers;

/// Builds the normalization pipeline: trivia hoisting, semantic mappings, function group
/// merging and role deduplication.
pub fn pipeline(config: &NormalizerConfig) -> Pipeline {
    let move_trivia = Mapping::new(
        "move-trivia",
        move_trivias(var("group"), config.trivia_redirect()),
        var("group"),
    );
    let merge = Mapping::new("merge-groups", merge_groups(var("group")), var("group"));

    let mut pipeline = Pipeline::new();
    pipeline.add_stage(Stage::new(
        "move-trivia",
        &[],
        Mappings::new("move-trivia", vec![move_trivia]),
    ));
    pipeline.add_stage(Stage::new(
        "semantic",
        &["move-trivia"],
        Mappings::new("semantic", normalizers()),
    ));
    pipeline.add_stage(Stage::new(
        "merge-groups",
        &["semantic"],
        Mappings::new("merge-groups", vec![merge]),
    ));
    pipeline.add_stage(Stage::new("roles-dedup", &["merge-groups"], RolesDedup));
    pipeline
}

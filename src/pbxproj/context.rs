//! Identifier allocation for one generation pass.
//!
//! [`GenerationContext::build`] walks the graph once and allocates every
//! object identifier the emitters will need. Emitters never allocate; they
//! only look identifiers up, so a record written by one section can be
//! referenced by any other.

use camino::Utf8PathBuf;
use indexmap::{Equivalent, IndexMap};
use rand::RngCore;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, warn};

use crate::graph::{BuildGraph, SourceEntry};

use super::{BuildVariant, GenerateError, IdRegistry, ObjectId};

/// Identifiers keyed by the logical object they belong to.
#[derive(Debug, Clone)]
pub struct RefMap<K> {
    kind: &'static str,
    ids: IndexMap<K, ObjectId>,
}

impl<K: Hash + Eq + fmt::Debug> RefMap<K> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ids: IndexMap::new(),
        }
    }

    /// Allocate an identifier for `key` unless it already has one.
    fn allocate<R: RngCore>(&mut self, key: K, ids: &mut IdRegistry<R>) {
        self.ids.entry(key).or_insert_with(|| ids.new_id());
    }

    /// Identifier allocated for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnmappedObject`] if `key` was never allocated.
    pub fn get<Q>(&self, key: &Q) -> Result<&ObjectId, GenerateError>
    where
        Q: ?Sized + Hash + Equivalent<K> + fmt::Debug,
    {
        self.ids
            .get(key)
            .ok_or_else(|| GenerateError::UnmappedObject {
                map: self.kind,
                key: format!("{key:?}"),
            })
    }

    /// Entries in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &ObjectId)> {
        self.ids.iter()
    }

    /// Number of allocated identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Identifiers of a synthetic aggregate target.
#[derive(Debug, Clone)]
pub struct AggregateIds {
    /// The `PBXAggregateTarget` record.
    pub target: ObjectId,
    /// Its configuration list.
    pub config_list: ObjectId,
    /// Its configuration per build variant.
    pub configs: RefMap<BuildVariant>,
}

impl AggregateIds {
    fn allocate<R: RngCore>(
        name: &'static str,
        variants: &[BuildVariant],
        ids: &mut IdRegistry<R>,
    ) -> Self {
        let mut configs = RefMap::new(name);
        for variant in variants {
            configs.allocate(variant.clone(), ids);
        }
        Self {
            target: ids.new_id(),
            config_list: ids.new_id(),
            configs,
        }
    }
}

/// Every identifier of one generation pass.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// The `PBXProject` record and root object.
    pub project: ObjectId,
    /// Configuration list of the project record.
    pub project_config_list: ObjectId,
    /// Project configuration per build variant.
    pub project_configs: RefMap<BuildVariant>,
    /// Root navigation group.
    pub main_group: ObjectId,
    /// `Sources` navigation group.
    pub sources_group: ObjectId,
    /// `Resources` navigation group.
    pub resources_group: ObjectId,
    /// `Products` navigation group.
    pub products_group: ObjectId,
    /// The `ALL_BUILD` aggregate target.
    pub all_build: AggregateIds,
    /// The `RUN_TESTS` aggregate target.
    pub run_tests: AggregateIds,
    /// Shell phase of `RUN_TESTS`.
    pub test_phase: ObjectId,
    /// File references by source-root-relative path.
    pub file_refs: RefMap<Utf8PathBuf>,
    /// Build-file pairings by target name and path.
    pub build_files: RefMap<(String, Utf8PathBuf)>,
    /// Product file references by target.
    pub product_refs: RefMap<String>,
    /// Build styles by variant.
    pub build_styles: RefMap<BuildVariant>,
    /// Sources build phase by target.
    pub build_phases: RefMap<String>,
    /// Build configuration by target and variant.
    pub build_configs: RefMap<(String, BuildVariant)>,
    /// Configuration list by target.
    pub config_lists: RefMap<String>,
    /// Native or legacy target record by target.
    pub native_targets: RefMap<String>,
    /// Target dependency record by target.
    pub target_deps: RefMap<String>,
    /// Container proxy record by target.
    pub container_proxies: RefMap<String>,
    /// Navigation group by target.
    pub target_groups: RefMap<String>,
    /// `Source files` navigation group by target.
    pub source_groups: RefMap<String>,
}

impl GenerationContext {
    /// Allocate every identifier needed to emit `graph` with `variants`.
    pub fn build<R: RngCore>(
        graph: &BuildGraph,
        variants: &[BuildVariant],
        ids: &mut IdRegistry<R>,
    ) -> Self {
        let mut cx = Self {
            project: ids.new_id(),
            project_config_list: ids.new_id(),
            project_configs: RefMap::new("project configuration"),
            main_group: ids.new_id(),
            sources_group: ids.new_id(),
            resources_group: ids.new_id(),
            products_group: ids.new_id(),
            all_build: AggregateIds::allocate("ALL_BUILD configuration", variants, ids),
            run_tests: AggregateIds::allocate("RUN_TESTS configuration", variants, ids),
            test_phase: ids.new_id(),
            file_refs: RefMap::new("file reference"),
            build_files: RefMap::new("build file"),
            product_refs: RefMap::new("product reference"),
            build_styles: RefMap::new("build style"),
            build_phases: RefMap::new("sources build phase"),
            build_configs: RefMap::new("build configuration"),
            config_lists: RefMap::new("configuration list"),
            native_targets: RefMap::new("native target"),
            target_deps: RefMap::new("target dependency"),
            container_proxies: RefMap::new("container proxy"),
            target_groups: RefMap::new("target group"),
            source_groups: RefMap::new("source group"),
        };

        for variant in variants {
            cx.project_configs.allocate(variant.clone(), ids);
            cx.build_styles.allocate(variant.clone(), ids);
        }

        for (name, target) in &graph.targets {
            for source in &target.sources {
                if let SourceEntry::Unrecognized(value) = source {
                    warn!(target = %name, source = %value, "skipping source of unknown shape");
                }
            }
            for path in target.source_paths().chain(target.object_paths()) {
                cx.file_refs.allocate(path.clone(), ids);
                cx.build_files.allocate((name.clone(), path), ids);
            }
            for variant in variants {
                cx.build_configs
                    .allocate((name.clone(), variant.clone()), ids);
            }
            for map in [
                &mut cx.product_refs,
                &mut cx.build_phases,
                &mut cx.config_lists,
                &mut cx.native_targets,
                &mut cx.target_deps,
                &mut cx.container_proxies,
                &mut cx.target_groups,
                &mut cx.source_groups,
            ] {
                map.allocate(name.clone(), ids);
            }
        }

        debug!(
            file_refs = cx.file_refs.len(),
            build_files = cx.build_files.len(),
            build_configs = cx.build_configs.len(),
            "built reference maps"
        );
        cx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Target, TargetKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn graph() -> BuildGraph {
        let mut graph = BuildGraph::new("demo");
        let mut app = Target::new("app", TargetKind::Executable);
        app.sources = vec![
            SourceEntry::Path("main.c".into()),
            SourceEntry::Path("util.c".into()),
            SourceEntry::Unrecognized(serde_json::json!({"generated": true})),
        ];
        app.objects = vec!["blob.o".into()];
        let mut tool = Target::new("tool", TargetKind::Executable);
        // Shares a source with `app`.
        tool.sources = vec![SourceEntry::Path("util.c".into())];
        graph.targets.insert("app".into(), app);
        graph.targets.insert("tool".into(), tool);
        graph
    }

    fn build(graph: &BuildGraph) -> GenerationContext {
        let mut ids = IdRegistry::with_rng(StdRng::seed_from_u64(1));
        GenerationContext::build(graph, &[BuildVariant::default()], &mut ids)
    }

    #[rstest]
    fn shared_files_get_one_reference_but_one_pairing_per_target(graph: BuildGraph) {
        let cx = build(&graph);
        assert_eq!(cx.file_refs.len(), 3);
        assert_eq!(cx.build_files.len(), 4);
        let app = cx
            .build_files
            .get(&("app".to_owned(), Utf8PathBuf::from("util.c")))
            .expect("app pairing");
        let tool = cx
            .build_files
            .get(&("tool".to_owned(), Utf8PathBuf::from("util.c")))
            .expect("tool pairing");
        assert_ne!(app, tool);
    }

    #[rstest]
    fn every_target_gets_a_dependency_and_proxy(graph: BuildGraph) {
        let cx = build(&graph);
        for name in graph.targets.keys() {
            assert!(cx.target_deps.get(name.as_str()).is_ok());
            assert!(cx.container_proxies.get(name.as_str()).is_ok());
            assert!(
                cx.build_configs
                    .get(&(name.clone(), BuildVariant::default()))
                    .is_ok()
            );
        }
    }

    #[rstest]
    fn missing_keys_name_their_map(graph: BuildGraph) {
        let cx = build(&graph);
        let err = cx.native_targets.get("ghost").expect_err("unmapped");
        assert!(matches!(
            err,
            GenerateError::UnmappedObject { map: "native target", ref key } if key.contains("ghost")
        ));
    }
}

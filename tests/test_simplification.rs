
use std::collections::HashMap;
use stochastic_testing_tools::*;
use treeseq::*;

fn simplify(
    tables: &TableCollection,
    samples: &[NodeId],
    flags: SimplificationFlags,
) -> (TableCollection, SimplificationOutput) {
    let mut tables = tables.clone();
    let mut output = SimplificationOutput::new();
    simplify_tables(samples, flags, &mut tables, &mut output).unwrap();
    (tables, output)
}

fn into_treeseq(mut tables: TableCollection) -> TreeSequence {
    tables.sort_tables();
    tables.build_indexes(IndexTablesFlags::empty()).unwrap();
    TreeSequence::new(tables, TreeSequenceFlags::empty()).unwrap()
}

fn sorted_mutations(tables: &TableCollection) -> Vec<(SiteId, NodeId, Option<Vec<u8>>)> {
    let mut rv = tables
        .mutations()
        .iter()
        .map(|m| (m.site, m.node, m.derived_state.clone()))
        .collect::<Vec<_>>();
    rv.sort();
    rv
}

type State = Option<Vec<u8>>;

// The state of each sample at every site: the derived state
// of the mutation closest above the sample, or the ancestral
// state if no ancestor carries one.
fn genotypes(tables: &TableCollection, samples: &[NodeId]) -> HashMap<Position, Vec<State>> {
    let mut rv = HashMap::new();
    for (i, site) in tables.sites().iter().enumerate() {
        let mutations = tables
            .mutations()
            .iter()
            .filter(|m| m.site == SiteId::from(i as i32))
            .collect::<Vec<_>>();
        let parents = naive_parents(tables, site.position);
        let states = samples
            .iter()
            .map(|s| {
                let mut u = *s;
                while !u.is_null() {
                    if let Some(m) = mutations.iter().rev().find(|m| m.node == u) {
                        return m.derived_state.clone();
                    }
                    u = parents[u.as_index()];
                }
                site.ancestral_state.clone()
            })
            .collect::<Vec<_>>();
        rv.insert(site.position, states);
    }
    rv
}

fn check_genotypes(tables: &TableCollection, samples: &[NodeId]) {
    let (simplified, output) = simplify(tables, samples, SimplificationFlags::default());
    let mapped = samples
        .iter()
        .map(|s| output.idmap[s.as_index()])
        .collect::<Vec<_>>();
    let before = genotypes(tables, samples);
    let after = genotypes(&simplified, &mapped);
    assert!(after.len() <= before.len());
    for site in tables.sites() {
        let expected = &before[&site.position];
        match after.get(&site.position) {
            Some(states) => assert_eq!(states, expected),
            // Dropped sites were invariant in the samples.
            None => assert!(expected.iter().all(|x| *x == site.ancestral_state)),
        }
    }
}

#[test]
fn test_genotypes_are_preserved() {
    init_logger();
    for psurvival in [0.0, 0.25] {
        let mut params = default_params(6666);
        params.psurvival = psurvival;
        let sims = Simulator::new(params, 3);
        for sim in sims.iter() {
            check_genotypes(&sim.tables, &sim.samples);
            let subset = sim.samples.iter().step_by(7).copied().collect::<Vec<_>>();
            check_genotypes(&sim.tables, &subset);
        }
    }
}

#[test]
fn test_samples_are_mapped_and_flagged() {
    init_logger();
    let mut params = default_params(1111);
    params.psurvival = 0.25;
    let sims = Simulator::new(params, 3);
    for sim in sims.iter() {
        let (simplified, output) =
            simplify(&sim.tables, &sim.samples, SimplificationFlags::default());
        assert_eq!(output.idmap.len(), sim.tables.num_nodes());
        for s in &sim.samples {
            let o = output.idmap[s.as_index()];
            assert!(!o.is_null());
            assert!(simplified.node(o).is_sample());
        }
        assert_eq!(simplified.sample_nodes().len(), sim.samples.len());

        let mut seen = vec![false; simplified.num_nodes()];
        for (i, o) in output.idmap.iter().enumerate() {
            if !o.is_null() {
                assert!(!seen[o.as_index()]);
                seen[o.as_index()] = true;
                assert_eq!(simplified.node(*o).time, sim.tables.node(i as i32).time);
            }
        }
        assert!(seen.iter().all(|x| *x));

        // Filtering leaves no invariant sites.
        for (i, _) in simplified.sites().iter().enumerate() {
            assert!(simplified
                .mutations()
                .iter()
                .any(|m| m.site == SiteId::from(i as i32)));
        }
        assert!(simplified
            .validate(TableValidationFlags::VALIDATE_ALL)
            .unwrap());
    }
}

#[test]
fn test_simplification_is_idempotent() {
    init_logger();
    let sims = Simulator::new(default_params(2222), 3);
    for sim in sims.iter() {
        let (once, output) = simplify(&sim.tables, &sim.samples, SimplificationFlags::default());
        let samples = sim
            .samples
            .iter()
            .map(|s| output.idmap[s.as_index()])
            .collect::<Vec<_>>();
        let (twice, output) = simplify(&once, &samples, SimplificationFlags::default());
        assert_eq!(once.nodes(), twice.nodes());
        assert_eq!(once.edges(), twice.edges());
        assert_eq!(once.sites(), twice.sites());
        assert_eq!(sorted_mutations(&once), sorted_mutations(&twice));
        for (i, o) in output.idmap.iter().enumerate() {
            assert_eq!(o.as_index(), i);
        }
    }
}

#[test]
fn test_unfiltered_sites_are_kept() {
    let sims = Simulator::new(default_params(3333), 2);
    for sim in sims.iter() {
        let (simplified, _) = simplify(&sim.tables, &sim.samples, SimplificationFlags::empty());
        assert_eq!(simplified.num_sites(), sim.tables.num_sites());
        let (filtered, _) = simplify(&sim.tables, &sim.samples, SimplificationFlags::default());
        assert!(filtered.num_sites() <= simplified.num_sites());
        assert_eq!(filtered.num_mutations(), simplified.num_mutations());
    }
}

#[test]
fn test_mrcas_are_preserved() {
    init_logger();
    let mut params = default_params(4444);
    params.psurvival = 0.1;
    let sims = Simulator::new(params, 2);
    for sim in sims.iter() {
        let (simplified, output) =
            simplify(&sim.tables, &sim.samples, SimplificationFlags::default());
        let samples = &sim.samples[..12];
        let mapped = samples
            .iter()
            .map(|s| output.idmap[s.as_index()])
            .collect::<Vec<_>>();

        let ts = into_treeseq(sim.tables);
        let simplified_ts = into_treeseq(simplified);
        assert!(simplified_ts.num_trees() <= ts.num_trees());

        let before = pairwise_mrcas(&ts, samples);
        let after = pairwise_mrcas(&simplified_ts, &mapped);
        let mut breakpoints = before
            .iter()
            .chain(after.iter())
            .map(|r| r.left)
            .collect::<Vec<_>>();
        breakpoints.sort();
        breakpoints.dedup();
        for x in breakpoints {
            let expected = mrcas_at(&before, x)
                .iter()
                .map(|m| {
                    if m.is_null() {
                        NodeId::NULL
                    } else {
                        output.idmap[m.as_index()]
                    }
                })
                .collect::<Vec<_>>();
            assert_eq!(mrcas_at(&after, x), expected.as_slice());
        }
    }
}

#[test]
fn test_tree_sequence_simplify() {
    let sims = Simulator::new(default_params(5555), 2);
    for sim in sims.iter() {
        let (expected, expected_output) =
            simplify(&sim.tables, &sim.samples, SimplificationFlags::default());
        let ts = TreeSequence::new(sim.tables, TreeSequenceFlags::empty()).unwrap();
        let (simplified, output) = ts.simplify(None, SimplificationFlags::default()).unwrap();
        assert_eq!(output.idmap, expected_output.idmap);
        assert_eq!(simplified.nodes(), expected.nodes());
        assert_eq!(simplified.edges(), expected.edges());
        assert_eq!(simplified.sites(), expected.sites());
        assert_eq!(simplified.mutations(), expected.mutations());

        let subset = &ts.sample_nodes()[..5];
        let (simplified, output) = ts
            .simplify(Some(subset), SimplificationFlags::default())
            .unwrap();
        assert_eq!(simplified.sample_nodes().len(), 5);
        for s in subset {
            assert!(!output.idmap[s.as_index()].is_null());
        }
    }
}

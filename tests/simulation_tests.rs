#[cfg(test)]
mod tests {
    use cluster_world::structure::{layered_structure, parse_structure};
    use cluster_world::{
        BondAttributes, BondRecord, ClusterSimulation, EngineError, Graph, LeavingGroupModel, Node, Population,
        SharedAttributes, SimulationConfig,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn n(key: &str) -> Node {
        Node::from(key)
    }

    fn frozen(seed: u64) -> SimulationConfig {
        SimulationConfig { seed, update_break_probabilities: false, ..Default::default() }
    }

    fn sorted(mut sizes: Vec<usize>) -> Vec<usize> {
        sizes.sort_unstable();
        sizes
    }

    // ========== Reference Scenarios ==========

    #[test]
    fn test_chain_breaks_at_certain_bond() {
        let records = parse_structure("A B 0 0\nB C 1 0\n").unwrap();
        let mut sim = ClusterSimulation::from_records(&records, &frozen(6)).unwrap();
        let result = sim.step_core().unwrap();

        assert_eq!(result.report.removed, 1);
        assert_eq!(sorted(result.cluster_sizes), vec![1, 2]);

        let population = sim.population();
        let ab = &population.graphs()[population.graph_of(&n("A")).unwrap()];
        assert!(ab.contains(&n("B")));
        assert!(ab.has_bond(&n("A"), &n("B")));
        assert!(!ab.has_bond(&n("B"), &n("C")));
        assert_eq!(population.graphs()[population.graph_of(&n("C")).unwrap()].node_count(), 1);
    }

    #[test]
    fn test_certain_reform_merges_disjoint_graphs() {
        let mut left = Graph::new();
        let mut right = Graph::new();
        for key in ["A", "B"] {
            left.add_node(n(key)).unwrap();
        }
        for key in ["C", "D"] {
            right.add_node(n(key)).unwrap();
        }
        left.add_bond(&n("A"), &n("B"), BondAttributes::new(0.0, 0.0).into()).unwrap();
        right.add_bond(&n("C"), &n("D"), BondAttributes::new(0.0, 0.0).into()).unwrap();
        let mut population = Population::from_graphs(vec![left, right]).unwrap();
        population
            .add_potential_reform_bond(&n("A"), &n("C"), SharedAttributes::new(BondAttributes::new(0.0, 1.0)))
            .unwrap();
        let mut sim = ClusterSimulation::new(population, &frozen(0));
        let result = sim.step_core().unwrap();

        assert_eq!(result.cluster_sizes, vec![4]);
        let merged = &sim.population().graphs()[0];
        assert!(merged.has_bond(&n("A"), &n("C")));
        assert!(!merged.has_potential_bond(&n("A"), &n("C")));
        assert!(merged.is_fully_connected());
    }

    #[test]
    fn test_model_boundary_values() {
        use cluster_world::BreakProbabilityModel;
        let model = LeavingGroupModel::new(0.5);
        assert!((model.break_probability(1) - 0.4545).abs() < 1e-4);
        assert!((model.break_probability(0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_bond_and_foreign_node_errors() {
        let population = Population::from_records(&[BondRecord::from(("a", "b", 0.5, 0.2))]).unwrap();
        let mut graph = Graph::new();
        for node in population.graphs()[0].nodes() {
            graph.add_node(node.clone()).unwrap();
        }

        assert_eq!(
            graph.remove_bond(&n("a"), &n("b")).unwrap_err(),
            EngineError::BondNotFound { src: n("a"), dest: n("b") }
        );
        assert_eq!(
            graph.add_bond(&n("a"), &n("elsewhere"), BondAttributes::new(0.5, 0.2).into()),
            Err(EngineError::UnknownNode { node: n("elsewhere") })
        );
    }

    // ========== Non-bridge Leaving Group Size ==========

    #[test]
    fn test_cycle_bond_feeds_whole_graph_size_to_model() {
        // Square a-b-c-d-a plus tail d-e. Cycle bonds are not bridges, so the
        // model sees the full five clusters; the tail sees one.
        let records = parse_structure("a b 0.5 0\nb c 0.5 0\nc d 0.5 0\nd a 0.5 0\nd e 0.5 0\n").unwrap();
        let mut population = Population::from_records(&records).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let seen = std::cell::RefCell::new(Vec::new());
        let model = |k: usize| {
            seen.borrow_mut().push(k);
            0.0
        };
        population.step(&mut rng, &model, true).unwrap();

        assert_eq!(sorted(seen.into_inner()), vec![1, 5, 5, 5, 5]);
    }

    // ========== Long Runs ==========

    #[test]
    fn test_layered_structure_long_run_keeps_invariants() {
        let records = layered_structure(10, 3, 0.5, 0.2);
        let config = SimulationConfig { steps: 200, ..Default::default() };
        let mut sim = ClusterSimulation::from_records(&records, &config).unwrap();
        let universe = sim.population().node_universe();

        for _ in 0..config.steps {
            let result = sim.step_core().unwrap();
            assert_eq!(result.cluster_sizes.iter().sum::<usize>(), universe.len());
            let population = sim.population();
            assert_eq!(population.node_universe(), universe);
            assert!(population.graphs().iter().all(Graph::is_fully_connected));
        }
    }

    #[test]
    fn test_runs_reproducible_across_instances() {
        let records = layered_structure(6, 3, 0.5, 0.3);
        let config = SimulationConfig { seed: 1234, ..Default::default() };
        let mut a = ClusterSimulation::from_records(&records, &config).unwrap();
        let mut b = ClusterSimulation::from_records(&records, &config).unwrap();

        let sa = a.run(80).unwrap();
        let sb = b.run(80).unwrap();
        assert_eq!(sa.cluster_sizes, sb.cluster_sizes);
        assert_eq!(sa.totals, sb.totals);
    }

    #[test]
    fn test_structure_errors_surface_before_running() {
        assert!(parse_structure("1 2 0.5\n").is_err());
        let err = Population::from_records(&[
            BondRecord::from(("1", "2", 0.5, 0.2)),
            BondRecord::from(("1", "1", 0.5, 0.2)),
        ])
        .unwrap_err();
        assert_eq!(err, EngineError::SelfBond { node: n("1") });
    }
}

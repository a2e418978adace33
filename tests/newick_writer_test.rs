use newick_splits::{
    DataSet, EdgeLength, NewickWriter, NewickWriterConfig, TaxonRegistry, Tree,
    TreeCollection, TreeComposer, parse_newick, write_newick,
};

fn compose(newick: &str, config: NewickWriterConfig) -> String {
    let collection = parse_newick(newick)
        .unwrap_or_else(|err| panic!("Failed to parse {newick}: {err}"));
    TreeComposer::new(config)
        .compose_tree(&collection.trees()[0], collection.registry())
        .unwrap()
}

fn leaf_labels(collection: &TreeCollection, tree: &Tree) -> Vec<String> {
    tree.leaf_taxa()
        .iter()
        .filter_map(|taxon_id| collection.registry().taxon(*taxon_id))
        .map(|taxon| taxon.display_label().to_string())
        .collect()
}

/// Child counts in post-order; equal shapes give equal sequences.
fn shape(tree: &Tree) -> Vec<usize> {
    tree.postorder_node_ids().iter().map(|id| tree.child_count(id)).collect()
}

fn lengths(tree: &Tree) -> Vec<Option<f64>> {
    tree.postorder_node_ids()
        .into_iter()
        .map(|id| tree.branch_length(id).and_then(EdgeLength::as_float))
        .collect()
}

#[test]
fn test_scenario_with_six_digits() {
    let composed = compose(
        "(A:1.0,(B:2.0,C:3.0)D:0.5);",
        NewickWriterConfig::new().with_leaf_precision(6),
    );
    assert_eq!(composed, "(A:1.000000,(B:2.000000,C:3.000000)D:0.500000);\n");
}

#[test]
fn test_default_precision() {
    let collection = parse_newick("(A:1.0,(B:2.0,C:3.0)D:0.5);").unwrap();
    assert_eq!(
        write_newick(&collection),
        "(A:1.0000000000,(B:2.0000000000,C:3.0000000000)D:0.500000);\n"
    );
}

#[test]
fn test_compose_options() {
    let default = NewickWriterConfig::default();

    let test_cases = vec![
        ("No edge lengths", "(A:1,B:2)C;", default.without_edge_lengths(), "(A,B)C;\n"),
        ("No internal labels", "((A,B)E,C)F;", default.without_internal_labels(), "((A,B),C);\n"),
        ("Blank written as underscore", "('Homo sapiens',B);", default, "(Homo_sapiens,B);\n"),
        ("Preserved blank", "('Homo sapiens',B);", default.with_preserve_spaces(true), "('Homo sapiens',B);\n"),
        ("Quoted underscore", "('A_B',C);", default, "('A_B',C);\n"),
        ("Unquoted underscore", "('A_B',C);", default.with_quote_underscores(false), "(A_B,C);\n"),
        ("Punctuation quoted", "('A,B',C);", default, "('A,B',C);\n"),
        ("Embedded quote", "('can''t',C);", default, "('can''t',C);\n"),
        ("Root edge length", "(A,B):0.5;", default, "(A,B):0.500000;\n"),
        ("Custom precision", "(A:1,B:2);", default.with_leaf_precision(2), "(A:1.00,B:2.00);\n"),
        ("Internal precision", "((A,B):1)C;", default.with_internal_precision(1), "((A,B):1.0)C;\n"),
        ("Single leaf", "A:1;", default, "A:1.0000000000;\n"),
        ("Internal label with blank", "((A,B)Clade_one,C);", default, "((A,B)Clade_one,C);\n"),
        ("Blank and newline", "('a b\nc',D);", default, "('a b\nc',D);\n"),
    ];

    for (name, newick, config, expected) in test_cases {
        println!("Testing: {}", name);
        assert_eq!(compose(newick, config), expected, "{name}");
    }
}

#[test]
fn test_unlabeled_leaf_written_by_node_id() {
    let collection = parse_newick("(,A);").unwrap();
    let tree = &collection.trees()[0];
    let root_id = tree.seed_node_id().unwrap();
    let unlabeled_id = tree.child_ids(&root_id)[0];

    assert_eq!(write_newick(&collection), format!("({unlabeled_id},A);\n"));
}

#[test]
fn test_text_edge_lengths() {
    let mut collection = parse_newick("(A,B);").unwrap();
    {
        let tree = &mut collection.trees_mut()[0];
        let leaf_ids = tree.tip_node_ids_all();
        tree.node_mut(Some(leaf_ids[0]))
            .unwrap()
            .set_branch_length(Some(EdgeLength::from("about two")));
        tree.node_mut(Some(leaf_ids[1]))
            .unwrap()
            .set_branch_length(Some(EdgeLength::from("2.5")));
    }

    assert_eq!(write_newick(&collection), "(A:about two,B:2.5000000000);\n");
}

#[test]
fn test_round_trip() {
    let test_cases = vec![
        ("Scenario", "(A:1.0,(B:2.0,C:3.0)D:0.5);"),
        ("Nested", "((A:0.1,B:0.25)E:0.3,(C:1.5,'D d':2)F:0.75,G:3)H;"),
        ("No lengths", "(((A,B),(C,D)),E);"),
        ("Small lengths", "(A:0.0000012345,B:123.456789);"),
        ("Quoted labels", "('A,B':1,'can''t':2,'x_y':3);"),
        ("Several trees", "(A,B);(B,(A,C));"),
        ("Blank and newline in label", "('a b\nc',D);"),
    ];

    for (name, newick) in test_cases {
        println!("Testing: {}", name);
        let original = parse_newick(newick).unwrap();
        let written = write_newick(&original);
        let reparsed = parse_newick(&written)
            .unwrap_or_else(|err| panic!("Failed to re-parse {written}: {err}"));

        assert_eq!(original.len(), reparsed.len(), "{name}");
        for (before, after) in original.iter().zip(reparsed.iter()) {
            assert_eq!(leaf_labels(&original, before), leaf_labels(&reparsed, after));
            assert_eq!(shape(before), shape(after), "{name}");
            for (x, y) in lengths(before).into_iter().zip(lengths(after)) {
                match (x, y) {
                    (Some(x), Some(y)) => assert!((x - y).abs() < 1e-6, "{name}: {x} != {y}"),
                    (x, y) => assert_eq!(x, y, "{name}"),
                }
            }
        }
    }
}

#[test]
fn test_registry_mismatch() {
    let collection = parse_newick("(A,B);").unwrap();
    let other = TaxonRegistry::from_labels(["A", "B"]);

    let err = TreeComposer::default()
        .compose_tree(&collection.trees()[0], &other)
        .unwrap_err();
    assert!(err.is_lookup_error());
}

#[test]
fn test_writer_without_dataset() {
    let mut sink: Vec<u8> = Vec::new();
    let err = NewickWriter::new(NewickWriterConfig::default()).write(&mut sink).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(sink.is_empty());
}

#[test]
fn test_writer_keeps_tree_order() {
    let newick: String = (0..64).map(|i| format!("(T{i}:{i},(A,B));\n")).collect();
    let collection = parse_newick(&newick).unwrap();

    let mut dataset = DataSet::new();
    _ = dataset.add_tree_collection(collection);

    let mut sink: Vec<u8> = Vec::new();
    NewickWriter::new(NewickWriterConfig::new().without_edge_lengths())
        .with_dataset(&dataset)
        .write(&mut sink)
        .unwrap();

    let expected: String = (0..64).map(|i| format!("(T{i},(A,B));\n")).collect();
    assert_eq!(String::from_utf8(sink).unwrap(), expected);
}

#[test]
fn test_writer_registry_filter() {
    let mut dataset = DataSet::new();
    _ = dataset.add_tree_collection(parse_newick("(A,B);").unwrap());
    let second_id = dataset.add_tree_collection(parse_newick("(C,D);(D,E);").unwrap()).registry().id();

    let config = NewickWriterConfig::default();

    let mut all: Vec<u8> = Vec::new();
    NewickWriter::new(config).with_dataset(&dataset).write(&mut all).unwrap();
    assert_eq!(String::from_utf8(all).unwrap(), "(A,B);\n(C,D);\n(D,E);\n");

    let mut filtered: Vec<u8> = Vec::new();
    NewickWriter::new(config)
        .with_dataset(&dataset)
        .with_registry(second_id)
        .write(&mut filtered)
        .unwrap();
    assert_eq!(String::from_utf8(filtered).unwrap(), "(C,D);\n(D,E);\n");
}

use newick_splits::{
    SplitBitmask, TaxonError, TaxonRef, TaxonRegistry, resolve_or_create_taxon,
};

fn labels(registry: &TaxonRegistry) -> Vec<String> {
    registry.labels().iter().map(|label| label.to_string()).collect()
}

#[test]
fn test_find_or_create() {
    let mut registry = TaxonRegistry::new();
    assert!(registry.is_empty());

    let a = registry.find_or_create(Some("A"), None).unwrap();
    let b = registry.find_or_create(Some("B"), None).unwrap();
    assert_ne!(a, b);
    assert_eq!(registry.find_or_create(Some("A"), None), Ok(a));
    assert_eq!(registry.len(), 2);
    assert_eq!(labels(&registry), vec!["A", "B"]);

    let oid = registry.taxon(a).unwrap().oid().to_string();
    assert!(oid.starts_with("Taxon"));
    assert_eq!(registry.find(None, Some(oid.as_str())), Some(a));
    assert_eq!(registry.find(Some("C"), None), None);

    let err = registry.find_or_create(None, None).unwrap_err();
    assert_eq!(err, TaxonError::MissingIdentity);
}

#[test]
fn test_new_taxon() {
    let mut registry = TaxonRegistry::from_labels(["A"]);

    let duplicate = registry.new_taxon(Some("A"), None, false).unwrap();
    assert_eq!(registry.len(), 2);
    assert_ne!(registry.find(Some("A"), None), Some(duplicate));

    let err = registry.new_taxon(Some("A"), None, true).unwrap_err();
    assert_eq!(err, TaxonError::DuplicateLabel("A".to_string()));

    let unlabeled = registry.new_taxon(None, Some("x1"), false).unwrap();
    assert_eq!(registry.taxon(unlabeled).unwrap().label(), None);
    assert_eq!(labels(&registry), vec!["A", "A", "x1"]);
}

#[test]
fn test_locking() {
    let mut registry = TaxonRegistry::from_labels(["A", "B"]);
    registry.lock();
    assert!(registry.is_locked());

    assert!(registry.find_or_create(Some("A"), None).is_ok());
    assert!(matches!(
        registry.find_or_create(Some("C"), None),
        Err(TaxonError::NotFound { .. })
    ));
    assert!(matches!(
        registry.new_taxon(Some("C"), None, false),
        Err(TaxonError::Locked(_))
    ));
    assert_eq!(registry.len(), 2);

    registry.unlock();
    assert!(registry.find_or_create(Some("C"), None).is_ok());
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_taxon_bitmasks() {
    let mut registry = TaxonRegistry::from_labels(["A", "B", "C", "D", "E"]);
    let taxon_ids = registry.taxon_ids().to_vec();

    for (index, taxon_id) in taxon_ids.iter().enumerate() {
        let expected: SplitBitmask = 1 << index;
        assert_eq!(registry.peek_bitmask(*taxon_id), Ok(expected));
        assert_eq!(registry.taxon(*taxon_id).unwrap().cached_split_bitmask(), None);
        assert_eq!(registry.taxon_bitmask(*taxon_id), Ok(expected));
        assert_eq!(registry.taxon(*taxon_id).unwrap().cached_split_bitmask(), Some(expected));
    }

    assert_eq!(registry.all_taxa_bitmask(), 0b11111);
    assert_eq!(registry.complement(0b00101), 0b11010);
    assert_eq!(registry.split_bitmask_string(0b00101), "00101");
}

#[test]
fn test_bitmasks_stable_across_lock_and_growth() {
    let mut registry = TaxonRegistry::from_labels(["A", "B", "C"]);
    let taxon_ids = registry.taxon_ids().to_vec();
    let before: Vec<SplitBitmask> = taxon_ids
        .iter()
        .map(|taxon_id| registry.taxon_bitmask(*taxon_id).unwrap())
        .collect();

    registry.lock();
    registry.unlock();
    let d = registry.find_or_create(Some("D"), None).unwrap();

    let after: Vec<SplitBitmask> = taxon_ids
        .iter()
        .map(|taxon_id| registry.taxon_bitmask(*taxon_id).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(registry.taxon_bitmask(d), Ok(0b1000));
    assert_eq!(registry.all_taxa_bitmask(), 0b1111);
}

#[test]
fn test_removal_shifts_positions() {
    let mut registry = TaxonRegistry::from_labels(["A", "B", "C"]);
    let taxon_ids = registry.taxon_ids().to_vec();

    let removed = registry.remove(taxon_ids[1]).unwrap();
    assert_eq!(removed.label(), Some("B"));
    assert!(!registry.contains(taxon_ids[1]));
    assert_eq!(registry.index_of(taxon_ids[2]), Ok(1));
    assert_eq!(registry.peek_bitmask(taxon_ids[2]), Ok(0b10));
    assert_eq!(registry.remove(taxon_ids[1]).unwrap_err(), TaxonError::NotMember(taxon_ids[1]));

    registry.clear();
    assert!(registry.is_empty());
    assert_eq!(registry.all_taxa_bitmask(), 0);
}

#[test]
fn test_bitmask_overflow() {
    let mut registry = TaxonRegistry::generate(130);
    let taxon_ids = registry.taxon_ids().to_vec();

    assert_eq!(registry.taxon_bitmask(taxon_ids[127]), Ok(1 << 127));
    assert_eq!(registry.taxon_bitmask(taxon_ids[128]), Err(TaxonError::BitmaskOverflow(128)));
    assert_eq!(registry.all_taxa_bitmask(), SplitBitmask::MAX);

    let message = TaxonError::BitmaskOverflow(128).to_string();
    assert_eq!(message, "Taxon at index 128 does not fit into a 128-bit split bitmask.");
}

#[test]
fn test_generate() {
    let test_cases = vec![
        ("Three taxa", 3, "T1", "T3"),
        ("Ten taxa", 10, "T01", "T10"),
        ("Hundred taxa", 100, "T001", "T100"),
    ];

    for (name, ntax, first, last) in test_cases {
        println!("Testing: {}", name);
        let registry = TaxonRegistry::generate(ntax);
        let generated = labels(&registry);
        assert_eq!(generated.len(), ntax);
        assert_eq!(generated.first().map(String::as_str), Some(first));
        assert_eq!(generated.last().map(String::as_str), Some(last));
    }

    let registry = TaxonRegistry::generate_with(2, |n| format!("sp{n}"));
    assert_eq!(labels(&registry), vec!["sp1", "sp2"]);
}

#[test]
fn test_resolve_or_create_taxon() {
    let mut registry = TaxonRegistry::from_labels(["A"]);
    let a = registry.find(Some("A"), None).unwrap();

    assert_eq!(resolve_or_create_taxon(&mut registry, TaxonRef::from("A")), Ok(a));
    assert_eq!(resolve_or_create_taxon(&mut registry, TaxonRef::from(a)), Ok(a));

    let b = resolve_or_create_taxon(&mut registry, "B".into()).unwrap();
    assert_eq!(registry.index_of(b), Ok(1));

    _ = registry.remove(b).unwrap();
    assert_eq!(
        resolve_or_create_taxon(&mut registry, TaxonRef::Identity(b)),
        Err(TaxonError::NotMember(b))
    );
}

#[test]
fn test_registry_display() {
    let registry = TaxonRegistry::from_labels(["A", "B"]).with_label("birds");
    let display = registry.to_string();
    assert_eq!(registry.label(), Some("birds"));
    assert!(display.starts_with(&registry.id().to_string()));
    assert!(display.ends_with(" ('birds') : [A, B]"), "{display}");

    assert_ne!(TaxonRegistry::new().id(), TaxonRegistry::new().id());
}

/// Loading NCBI dump files from disk and resolving against them
use taxalink_core::load_config;
use taxalink_resolve::store::ncbi::{load_accession2taxid, load_configured, load_taxdump};
use taxalink_resolve::{LineageBounds, Mapper, MemoryTaxonStore, Rank, TaxaError, TaxonId};
use taxalink_test::{with_test_env, write_accession2taxid, TestEnvironment, FIXTURE_MERGED};

#[test]
fn test_load_taxdump_from_directory() {
    with_test_env(|env| {
        env.install_taxdump()?;
        let (store, aliases) = load_taxdump(env.taxonomy_dir())?;

        assert_eq!(store.len(), 14);
        assert_eq!(aliases.len(), FIXTURE_MERGED.len());
        assert_eq!(aliases.resolve(TaxonId(555)), Some(TaxonId::HUMAN));

        let root = store.get(TaxonId::ROOT).unwrap();
        assert!(root.is_root());
        assert_eq!(store.get(TaxonId::EUKARYOTA).unwrap().rank, Rank::Superkingdom);
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_missing_merged_dmp_gives_empty_alias_index() {
    let env = TestEnvironment::new().unwrap();
    env.install_taxdump().unwrap();
    std::fs::remove_file(env.taxonomy_dir().join("merged.dmp")).unwrap();

    let (store, aliases) = load_taxdump(env.taxonomy_dir()).unwrap();
    assert!(!store.is_empty());
    assert!(aliases.is_empty());
}

#[test]
fn test_plain_and_gzipped_accession_tables() {
    let env = TestEnvironment::new().unwrap();
    let plain = env.root().join("prot.accession2taxid");
    let gzipped = env.root().join("nucl.accession2taxid.gz");
    write_accession2taxid(&plain).unwrap();
    write_accession2taxid(&gzipped).unwrap();

    let mut from_plain = MemoryTaxonStore::new();
    let mut from_gz = MemoryTaxonStore::new();
    assert_eq!(load_accession2taxid(&mut from_plain, &plain).unwrap(), 3);
    assert_eq!(load_accession2taxid(&mut from_gz, &gzipped).unwrap(), 3);
    assert_eq!(from_plain.accession_count(), from_gz.accession_count());
}

#[test]
fn test_corrupt_nodes_file_is_a_parse_error() {
    let env = TestEnvironment::new().unwrap();
    env.install_taxdump().unwrap();
    env.write_file("taxonomy/nodes.dmp", "1\t|\t1\t|\tno rank\t|\nnot-a-taxid\t|\t1\t|\tgenus\t|\n")
        .unwrap();

    let err = load_taxdump(env.taxonomy_dir()).unwrap_err();
    assert!(matches!(err, TaxaError::Parse(msg) if msg.contains("line 2")));
}

#[tokio::test]
async fn test_configured_store_resolves_accessions_and_lineages() {
    let env = TestEnvironment::new().unwrap();
    let config = load_config(env.write_config().unwrap()).unwrap();

    let (store, aliases) = load_configured(&config.store, &env.root().join("unused")).unwrap();
    let mapper = Mapper::from_config(store, &config).unwrap();
    assert!(!mapper.has_remote());

    let query = mapper
        .map_by_accession(["NC_005089.1", "NM_000546", "ZZ_999999.1"], "nucleotide")
        .await
        .unwrap();
    assert_eq!(
        query.get(&"NC_005089.1".to_string()).unwrap().taxa().unwrap()[0].id,
        TaxonId::MOUSE
    );
    assert_eq!(
        query.get(&"NM_000546".to_string()).unwrap().taxa().unwrap()[0].id,
        TaxonId::HUMAN
    );
    assert_eq!(query.unmatched().count(), 1);

    let families = mapper
        .lineages(query.taxon_map().into_keys(), &aliases, &LineageBounds::single(Rank::Family))
        .await
        .unwrap();
    assert_eq!(families[&TaxonId::HUMAN].as_ref().unwrap()[0].scientific_name, "Hominidae");
    assert_eq!(families[&TaxonId::MOUSE].as_ref().unwrap()[0].scientific_name, "Muridae");
}

#[tokio::test]
async fn test_synonyms_resolve_with_matched_name() {
    let env = TestEnvironment::new().unwrap();
    env.install_taxdump().unwrap();
    let (store, _) = load_taxdump(env.taxonomy_dir()).unwrap();
    let mapper = Mapper::new(store);

    let query = mapper.map_by_name(["Human", "Mus muscaris"]).await.unwrap();

    let human = &query.get(&"Human".to_string()).unwrap().taxa().unwrap()[0];
    assert_eq!(human.id, TaxonId::HUMAN);
    assert_eq!(human.name, "Human");
    assert_eq!(human.scientific_name, "Homo sapiens");
    assert!(query.get(&"Mus muscaris".to_string()).unwrap().is_match());
}

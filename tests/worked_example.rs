use std::collections::HashSet;

use bio::alphabets::dna;
use fragment_assembly::{Assembly, AssemblyConfig, Feature, Location, SeqRecord, Strand};

const A: &str = "AacgatCAtgctcc";
const B: &str = "TtgctccTAAattctgc";
const C: &str = "CattctgcGAGGacgatG";

/// Two fragments joined by two distinct overlaps, which makes parallel edges.
const P1: &str = "TTAGTTGTGAAGTAGTGCGCCGCAGC";
const P2: &str = "GCCGCAGCTTGAAATATGTTAGTTGT";

fn fragments() -> Vec<SeqRecord> {
    vec![
        SeqRecord::new("a", A),
        SeqRecord::new("b", B),
        SeqRecord::new("c", C),
    ]
}

fn config(limit: usize, use_fragment_order: bool) -> AssemblyConfig {
    AssemblyConfig {
        limit,
        use_fragment_order,
        ..AssemblyConfig::default()
    }
}

fn seqs(records: &[SeqRecord]) -> Vec<String> {
    records.iter().map(|r| r.seq_str().into_owned()).collect()
}

fn fwd(start: usize, end: usize) -> Location {
    Location::simple(start, end, Strand::Forward)
}

fn location_of<'r>(record: &'r SeqRecord, kind: &str) -> &'r Location {
    &record
        .features()
        .iter()
        .find(|f| f.kind == kind)
        .unwrap_or_else(|| panic!("feature {kind} missing"))
        .location
}

#[test]
fn linear_assemblies_without_fragment_order() {
    let asm = Assembly::new(fragments(), config(5, false));
    let listed: Vec<String> = asm
        .get_linear_assemblies()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        listed,
        vec![
            "((1, 2, '1[8:14](+):2[1:7](+)'), (2, 3, '2[10:17](+):3[1:8](+)'))",
            "((2, 3, '2[10:17](+):3[1:8](+)'), (3, 1, '3[12:17](+):1[1:6](+)'))",
            "((3, 1, '3[12:17](+):1[1:6](+)'), (1, 2, '1[8:14](+):2[1:7](+)'))",
            "((1, 3, '1[1:6](+):3[12:17](+)'),)",
            "((2, 1, '2[1:7](+):1[8:14](+)'),)",
            "((3, 2, '3[1:8](+):2[10:17](+)'),)",
        ]
    );
    assert_eq!(
        seqs(&asm.assemble_linear().unwrap()),
        vec![
            "AacgatCAtgctccTAAattctgcGAGGacgatG",
            "TtgctccTAAattctgcGAGGacgatCAtgctcc",
            "CattctgcGAGGacgatCAtgctccTAAattctgc",
            "AacgatG",
            "Ttgctcc",
            "Cattctgc",
        ]
    );
}

#[test]
fn circular_assembly_of_three_fragments() {
    let asm = Assembly::new(fragments(), config(5, true));
    let circular = asm.get_circular_assemblies();
    assert_eq!(circular.len(), 1);
    assert_eq!(circular[0].nodes(), vec![1, 2, 3]);
    assert!(circular[0].is_circular());

    let records = asm.assemble_circular().unwrap();
    assert_eq!(seqs(&records), vec!["acgatCAtgctccTAAattctgcGAGG"]);
    assert!(records[0].is_circular());
    assert_eq!(records[0].name(), "a+b+c");
}

#[test]
fn fragment_order_constrains_ends() {
    let asm = Assembly::new(fragments(), config(5, true));
    let linear = asm.get_linear_assemblies();
    assert!(!linear.is_empty());
    for assembly in &linear {
        let nodes = assembly.nodes();
        assert_eq!(nodes[0].abs(), 1, "{assembly} does not start at fragment 1");
        assert_eq!(nodes[nodes.len() - 1].abs(), 3, "{assembly} does not end at fragment 3");
    }
    assert_eq!(
        seqs(&asm.assemble_linear().unwrap()),
        vec![
            "AacgatCAtgctccTAAattctgcGAGGacgatG",
            "AacgatG",
            "ggagcaTGatcgtCCTCgcagaatG",
        ]
    );
}

#[test]
fn returned_assemblies_are_valid_and_maximal() {
    let asm = Assembly::new(fragments(), config(5, false));
    let linear = asm.get_linear_assemblies();
    for (i, assembly) in linear.iter().enumerate() {
        assert!(asm.validate_assembly(assembly));
        for (j, other) in linear.iter().enumerate() {
            if i != j {
                assert!(!assembly.is_subassembly_of(other), "{assembly} inside {other}");
            }
        }
    }
    for assembly in asm.get_circular_assemblies() {
        assert!(asm.validate_assembly(&assembly));
    }
}

#[test]
fn use_all_fragments_requires_every_fragment() {
    let config = AssemblyConfig {
        use_all_fragments: true,
        ..config(5, false)
    };
    let asm = Assembly::new(fragments(), config);
    let linear = asm.get_linear_assemblies();
    assert_eq!(linear.len(), 3);
    for assembly in &linear {
        let used: HashSet<i32> = assembly.nodes().iter().map(|n| n.abs()).collect();
        assert_eq!(used, HashSet::from([1, 2, 3]));
    }
    assert_eq!(asm.get_circular_assemblies().len(), 1);
}

#[test]
fn two_fragments_join_once() {
    let pair = vec![SeqRecord::new("a", A), SeqRecord::new("b", B)];

    let asm = Assembly::new(pair.clone(), config(5, false));
    assert_eq!(
        seqs(&asm.assemble_linear().unwrap()),
        vec!["AacgatCAtgctccTAAattctgc", "Ttgctcc"]
    );
    assert!(asm.get_circular_assemblies().is_empty());

    let ordered = Assembly::new(pair, config(5, true));
    let linear = ordered.get_linear_assemblies();
    assert_eq!(linear.len(), 2);
    assert_eq!(
        linear[1].to_string(),
        "((-1, -2, '-1[0:6](-):-2[10:16](-)'),)"
    );
    assert_eq!(
        seqs(&ordered.assemble_linear().unwrap()),
        vec!["AacgatCAtgctccTAAattctgc", "ggagcaA"]
    );
}

#[test]
fn assembling_twice_is_identical() {
    let asm = Assembly::new(fragments(), config(5, false));
    for assembly in asm
        .get_linear_assemblies()
        .iter()
        .chain(asm.get_circular_assemblies().iter())
    {
        let first = asm.assemble(assembly).unwrap();
        let second = asm.assemble(assembly).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn reverse_complemented_inputs_mirror_the_results() {
    let forward = Assembly::new(fragments(), config(5, false));
    let reversed = Assembly::new(
        fragments()
            .iter()
            .map(SeqRecord::reverse_complement)
            .collect(),
        config(5, false),
    );

    let mut expected: Vec<String> = forward
        .assemble_linear()
        .unwrap()
        .iter()
        .map(|r| String::from_utf8(dna::revcomp(r.seq())).unwrap())
        .collect();
    let mut actual = seqs(&reversed.assemble_linear().unwrap());
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);

    let circular = reversed.get_circular_assemblies();
    assert_eq!(circular.len(), 1);
    assert_eq!(circular[0].nodes(), vec![1, 3, 2]);
    let record = reversed.assemble(&circular[0]).unwrap();
    assert_eq!(record.seq_str(), "ggagcaTGatcgtCCTCgcagaatTTA");
}

#[test]
fn parallel_edges_yield_separate_assemblies() {
    let pair = vec![SeqRecord::new("p1", P1), SeqRecord::new("p2", P2)];
    let asm = Assembly::new(pair, config(6, false));
    assert_eq!(asm.graph().edge_count(), 8);
    assert_eq!(asm.graph().edges_between(1, 2).count(), 2);

    let circular = asm.get_circular_assemblies();
    assert_eq!(circular.len(), 1);
    assert_eq!(
        circular[0].to_string(),
        "((1, 2, '1[18:26](+):2[0:8](+)'), (2, 1, '2[18:26](+):1[0:8](+)'))"
    );
    let record = asm.assemble(&circular[0]).unwrap();
    assert_eq!(record.seq_str(), "TTAGTTGTGAAGTAGTGCGCCGCAGCTTGAAATATG");
    // Overlaps sit at the fragment ends, so the length is additive.
    assert_eq!(record.len(), P1.len() + P2.len() - 8 - 8);

    assert_eq!(
        seqs(&asm.assemble_linear().unwrap()),
        vec![
            "TTAGTTGT",
            "TTAGTTGTGAAGTAGTGCGCCGCAGCTTGAAATATGTTAGTTGT",
            "GCCGCAGCTTGAAATATGTTAGTTGTGAAGTAGTGCGCCGCAGC",
            "GCCGCAGC",
        ]
    );
    let joined = &asm.get_linear_assemblies()[1];
    assert_eq!(asm.assemble(joined).unwrap().len(), P1.len() + P2.len() - 8);
}

#[test]
fn features_follow_their_fragments() {
    let annotated = vec![
        SeqRecord::new("a", A).with_feature(Feature::new("fa", fwd(1, 6))),
        SeqRecord::new("b", B).with_feature(Feature::new("fb", fwd(10, 17))),
        SeqRecord::new("c", C).with_features(vec![
            Feature::new("fc1", fwd(12, 17)),
            Feature::new("fc2", fwd(8, 17)),
            Feature::new("fc3", Location::simple(2, 6, Strand::Reverse)).with_label("rev"),
        ]),
    ];
    let asm = Assembly::new(annotated, config(5, true));

    let linear = asm.assemble(&asm.get_linear_assemblies()[0]).unwrap();
    assert_eq!(linear.seq_str(), "AacgatCAtgctccTAAattctgcGAGGacgatG");
    assert_eq!(location_of(&linear, "fa"), &fwd(1, 6));
    assert_eq!(location_of(&linear, "fb"), &fwd(17, 24));
    assert_eq!(location_of(&linear, "fc1"), &fwd(28, 33));
    assert_eq!(location_of(&linear, "fc2"), &fwd(24, 33));
    assert_eq!(
        location_of(&linear, "fc3"),
        &Location::simple(18, 22, Strand::Reverse)
    );

    let circular = asm.assemble_circular().unwrap();
    let record = &circular[0];
    assert_eq!(location_of(record, "fa"), &fwd(0, 5));
    assert_eq!(location_of(record, "fb"), &fwd(16, 23));
    assert_eq!(location_of(record, "fc1"), &fwd(0, 5));
    assert_eq!(
        location_of(record, "fc2").to_string(),
        "join{[23:27](+), [0:5](+)}"
    );
    assert_eq!(
        location_of(record, "fc3"),
        &Location::simple(17, 21, Strand::Reverse)
    );
    // A wrapped feature reads the same bases it covered on its fragment.
    let fc2 = Feature::new("fc2", fwd(8, 17));
    let source = SeqRecord::new("c", C);
    let wrapped = record
        .features()
        .iter()
        .find(|f| f.kind == "fc2")
        .unwrap();
    assert_eq!(record.extract(wrapped), source.extract(&fc2));
}

#[test]
fn short_fragments_produce_nothing() {
    let asm = Assembly::new(fragments(), AssemblyConfig::default());
    assert_eq!(asm.graph().node_count(), 6);
    assert_eq!(asm.graph().edge_count(), 0);
    assert!(asm.get_linear_assemblies().is_empty());
    assert!(asm.get_circular_assemblies().is_empty());
    assert!(asm.assemble_linear().unwrap().is_empty());
}

use brammap_memory::{ParseError, Rules};

use quickcheck::{Arbitrary, Gen};

const EXAMPLE: &str = r#"
# a dual-port block ram and two policies for it
bram RAMB1024X32
  init 1             # can be initialized
  abits 10
  dbits 32
  groups 2
  ports  1 1
  wrmode 1 0
  enable 4 0
  transp 0 2
  clocks 1 2
  clkpol 2 2
endbram

match RAMB1024X32
  min bits 512
  max waste 16384
endmatch

match RAMB1024X32
endmatch
"#;

#[test]
fn test_example() {
    let rules = Rules::parse(EXAMPLE).unwrap();
    assert_eq!(rules.brams.len(), 1);
    let bram = &rules.brams["RAMB1024X32"];
    assert!(bram.init);
    assert_eq!(bram.abits, 10);
    assert_eq!(bram.dbits, 32);
    assert_eq!(bram.groups, 2);
    assert_eq!(bram.ports, vec![1, 1]);
    assert_eq!(bram.wrmode, vec![true, false]);
    assert_eq!(bram.enable, vec![4, 0]);
    assert_eq!(bram.transp, vec![0, 2]);
    assert_eq!(bram.clocks, vec![1, 2]);
    assert_eq!(bram.clkpol, vec![2, 2]);

    assert_eq!(rules.matches.len(), 2);
    assert_eq!(rules.matches[0].name, "RAMB1024X32");
    assert_eq!(rules.matches[0].min_limits["bits"], 512);
    assert_eq!(rules.matches[0].max_limits["waste"], 16384);
    assert!(rules.matches[1].min_limits.is_empty());
    assert!(rules.matches[1].max_limits.is_empty());
}

#[test]
fn test_empty() {
    let rules = Rules::parse("").unwrap();
    assert!(rules.brams.is_empty());
    assert!(rules.matches.is_empty());

    let rules = Rules::parse("# only comments\n\n   \n# more\n").unwrap();
    assert!(rules.brams.is_empty());
}

#[test]
fn test_syntax_error_line() {
    let text = "bram A\n  abits 2\n  frobnicate 3\nendbram\n";
    match Rules::parse(text) {
        Err(ParseError::Syntax { line, text }) => {
            assert_eq!(line, 3);
            assert_eq!(text, "frobnicate 3");
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_bad_integer() {
    assert!(matches!(Rules::parse("bram A\n  abits two\nendbram\n"), Err(ParseError::Syntax { line: 2, .. })));
    assert!(matches!(Rules::parse("match A\n  min words x\nendmatch\n"), Err(ParseError::Syntax { line: 2, .. })));
}

#[test]
fn test_unexpected_eof() {
    assert!(matches!(Rules::parse("bram A\n  abits 2\n"), Err(ParseError::UnexpectedEof { .. })));
    assert!(matches!(Rules::parse("match A\n  min words 4"), Err(ParseError::UnexpectedEof { .. })));
}

#[test]
fn test_top_level_junk() {
    assert!(matches!(Rules::parse("blockram A\nendbram\n"), Err(ParseError::Syntax { line: 1, .. })));
}

#[test]
fn test_negative_limits() {
    let rules = Rules::parse("match A\n  min waste -5\nendmatch\n").unwrap();
    assert_eq!(rules.matches[0].min_limits["waste"], -5);
}

#[test]
fn test_roundtrip_example() {
    let rules = Rules::parse(EXAMPLE).unwrap();
    let reparsed = Rules::parse(&rules.to_string()).unwrap();
    assert_eq!(rules, reparsed);
}

fn identifier(g: &mut Gen, salt: usize) -> String {
    let letters = ['A', 'B', 'R', 'M', 'X', 'r', 'a', 'm'];
    let mut name = String::new();
    for _ in 0..3 {
        name.push(*g.choose(&letters).unwrap());
    }
    format!("{}{}", name, salt)
}

fn small_vec(g: &mut Gen, len: usize, bound: usize) -> Vec<usize> {
    (0..len).map(|_| usize::arbitrary(g) % bound).collect()
}

#[derive(Debug, Clone)]
struct ArbRules(Rules);

impl Arbitrary for ArbRules {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut rules = Rules::default();
        for index in 0..usize::arbitrary(g) % 3 + 1 {
            let groups = usize::arbitrary(g) % 3 + 1;
            let bram = brammap_memory::BramType {
                name: identifier(g, index),
                init: bool::arbitrary(g),
                abits: usize::arbitrary(g) % 12,
                dbits: usize::arbitrary(g) % 32 + 1,
                groups,
                ports: small_vec(g, groups, 3),
                wrmode: small_vec(g, groups, 2).into_iter().map(|mode| mode != 0).collect(),
                enable: small_vec(g, groups, 5),
                transp: small_vec(g, groups, 3),
                clocks: small_vec(g, groups, 4),
                clkpol: small_vec(g, groups, 4),
            };
            rules.brams.insert(bram.name.clone(), bram);
        }
        let properties = ["words", "abits", "dbits", "wports", "rports", "bits", "ports", "awaste", "dwaste", "waste"];
        let bram_names: Vec<&String> = rules.brams.keys().collect();
        let mut matches = vec![];
        for _ in 0..usize::arbitrary(g) % 4 {
            let mut rule = brammap_memory::MatchRule {
                name: (*g.choose(&bram_names).unwrap()).clone(),
                ..Default::default()
            };
            for _ in 0..usize::arbitrary(g) % 3 {
                rule.min_limits.insert(g.choose(&properties).unwrap().to_string(), i64::arbitrary(g) % 1000);
            }
            for _ in 0..usize::arbitrary(g) % 3 {
                rule.max_limits.insert(g.choose(&properties).unwrap().to_string(), i64::arbitrary(g) % 1000);
            }
            matches.push(rule);
        }
        rules.matches = matches;
        ArbRules(rules)
    }
}

quickcheck::quickcheck! {
    fn prop_roundtrip(rules: ArbRules) -> bool {
        let ArbRules(rules) = rules;
        Rules::parse(&rules.to_string()).map(|reparsed| reparsed == rules).unwrap_or(false)
    }
}

//! The test corpus
//!
//! The built-in corpus is the reference set (24 positive, 10 negative,
//! 1 real-time UI case). Alternative corpora load from YAML: either a single
//! file holding a list of cases or a directory of such files.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::case::{Intent, LengthClass, TestCase};
use crate::error::{Error, Result};
use crate::record::ResultRecord;

/// Marker stored as the expected output of negative cases
pub const SHOULD_FAIL: &str = "SHOULD FAIL";

/// Phrase typed prefix by prefix in the real-time case
pub const REALTIME_PHRASE: &str = "mama gedhara yanavaa";

/// Ordered, validated collection of test cases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    cases: Vec<TestCase>,
}

impl Corpus {
    /// Build a corpus, rejecting malformed or duplicate ids
    pub fn new(cases: Vec<TestCase>) -> Result<Self> {
        let mut seen = HashSet::new();
        for case in &cases {
            case.validate()?;
            if !seen.insert(case.id.as_str()) {
                return Err(Error::DuplicateCase(case.id.clone()));
            }
        }
        Ok(Self { cases })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let cases: Vec<TestCase> = serde_yaml::from_str(yaml)?;
        Self::new(cases)
    }

    /// Load a YAML file, or every `.yaml`/`.yml` file under a directory in path order
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            return Self::from_yaml(&content);
        }

        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut cases = Vec::new();
        for file in files {
            debug!("Loading corpus file {}", file.display());
            let content = std::fs::read_to_string(&file)?;
            let mut batch: Vec<TestCase> = serde_yaml::from_str(&content)?;
            cases.append(&mut batch);
        }
        Self::new(cases)
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Keep only cases whose id starts with `prefix`
    pub fn filter_prefix(&self, prefix: &str) -> Self {
        Self {
            cases: self
                .cases
                .iter()
                .filter(|c| c.id.starts_with(prefix))
                .cloned()
                .collect(),
        }
    }

    pub fn count_intent(&self, intent: Intent) -> usize {
        self.cases.iter().filter(|c| c.intent == intent).count()
    }

    /// Sort records into corpus order; records for unknown ids go last
    pub fn order_records(&self, records: &mut [ResultRecord]) {
        let position: HashMap<&str, usize> = self
            .cases
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();
        records.sort_by_key(|r| position.get(r.id.as_str()).copied().unwrap_or(usize::MAX));
    }
}

impl IntoIterator for Corpus {
    type Item = TestCase;
    type IntoIter = std::vec::IntoIter<TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.into_iter()
    }
}

fn positive(
    id: &str,
    desc: &str,
    input: &str,
    expected: &str,
    domain: &str,
    grammar: &str,
    length: LengthClass,
) -> TestCase {
    TestCase {
        id: id.to_string(),
        description: desc.to_string(),
        input: input.to_string(),
        expected: expected.to_string(),
        domain: domain.to_string(),
        grammar: grammar.to_string(),
        length,
        intent: Intent::Positive,
    }
}

fn negative(
    id: &str,
    desc: &str,
    input: impl Into<String>,
    domain: &str,
    length: LengthClass,
) -> TestCase {
    TestCase {
        id: id.to_string(),
        description: desc.to_string(),
        input: input.into(),
        expected: SHOULD_FAIL.to_string(),
        domain: domain.to_string(),
        grammar: "Simple sentence".to_string(),
        length,
        intent: Intent::Negative,
    }
}

/// The reference corpus
pub fn builtin() -> Corpus {
    use LengthClass::{Long as L, Medium as M, Short as S};

    const DAILY: &str = "Daily language usage";
    const GREETING: &str = "Greeting / request / response";
    const POLITE: &str = "Polite vs informal phrasing";
    const SLANG: &str = "Slang / informal language";
    const COMBINATION: &str = "Word combination / phrase pattern";
    const MIXED: &str = "Mixed Singlish + English";
    const PUNCTUATION: &str = "Punctuation / numbers";
    const TYPO: &str = "Typographical error handling";
    const SIMPLE: &str = "Simple sentence";

    #[rustfmt::skip]
    let cases = vec![
        // Sentence structures
        positive("Pos_Fun_0001", "Simple Sentence", "mama gedhara yanavaa", "මම ගෙදර යනවා", DAILY, SIMPLE, S),
        positive("Pos_Fun_0002", "Compound Sentence", "mama gedhara yanavaa, haebaeyi vahina nisaa dhaenna yannee naee", "මම ගෙදර යනවා, හැඬැයි වහින නිසා දැන් යන්නේ නැහැ", DAILY, "Compound sentence", M),
        positive("Pos_Fun_0003", "Complex Sentence", "oya enavaanam mama balan innavaa", "ඔයා එනවනම් මම බලන් ඉන්නවා", DAILY, "Complex sentence", S),
        positive("Pos_Fun_0004", "Interrogative Question", "oyaata kohomadha?", "ඔයාට කොහොමද?", GREETING, "Interrogative (question)", S),
        positive("Pos_Fun_0005", "Imperative Command", "vahaama enna", "වහාම එන්න", GREETING, "Imperative (command)", S),
        positive("Pos_Fun_0006", "Positive Form", "mama ehema karanavaa", "මම එහෙම කරනවා", DAILY, "Present tense", S),
        positive("Pos_Fun_0007", "Negative Form", "mama ehema karannee naehae", "මම එහෙම කරන්නේ නැහැ", "Negation patterns", "Negation (negative form)", S),
        // Daily language usage
        positive("Pos_Fun_0008", "Common Greeting", "aayuboovan", "ආයුබෝවන්", GREETING, SIMPLE, S),
        positive("Pos_Fun_0009", "Polite Request", "karuNaakaralaa eka poddak balanna", "කරුණාකරලා එක පොඩ්ඩක් බලන්න", POLITE, "Request forms", M),
        positive("Pos_Fun_0010", "Informal Phrase", "eeyi, ooka dhiyan", "ඒයි, ඕක ඩියන්", SLANG, SIMPLE, S),
        positive("Pos_Fun_0011", "Day-to-day Expression", "mata nidhimathayi", "මට නිදිමතයි", DAILY, SIMPLE, S),
        // Word combinations
        positive("Pos_Fun_0012", "Multi-word Expression", "mata oona poddak inna", "මට ඕන පොඩ්ඩක් ඉන්න", COMBINATION, SIMPLE, S),
        positive("Pos_Fun_0013", "Proper Spacing", "mama gedhara yanavaa. mata paan kanna oonee.", "මම ගෙදර යනවා. මට පාන් කන්න ඕනේ.", COMBINATION, SIMPLE, M),
        positive("Pos_Fun_0014", "Repeated Words Emphasis", "hari hari eka eka", "හරි හරි එක එක", COMBINATION, SIMPLE, S),
        // Grammatical forms
        positive("Pos_Fun_0015", "Past Tense", "mama iyee gedhara giyaa", "මම ඊයේ ගෙදර ගියා", DAILY, "Past tense", S),
        positive("Pos_Fun_0016", "Future Tense", "mama heta enavaa", "මම හෙට එනවා", DAILY, "Future tense", S),
        positive("Pos_Fun_0017", "Plural Usage", "api yamu", "අපි යමු", DAILY, "Plural form", S),
        positive("Pos_Fun_0018", "Polite Request Form", "karuNaakara eeka dhenavadha?", "කරුණාකර එක දෙනවද?", POLITE, "Request forms", S),
        // Mixed language
        positive("Pos_Fun_0019", "English Brand in Singlish", "Zoom meeting ekak thiyennee", "Zoom meeting එකක් තියෙන්නේ", MIXED, SIMPLE, M),
        positive("Pos_Fun_0020", "English Abbreviation", "mata OTP ekak avashya", "මට OTP එකක් අවශ්‍ය", MIXED, SIMPLE, S),
        // Punctuation and formatting
        positive("Pos_Fun_0021", "With Punctuation", "hari! oyaata kohomadha?", "හරි! ඔයාට කොහොමද?", PUNCTUATION, "Interrogative (question)", S),
        positive("Pos_Fun_0022", "Currency Format", "Rs. 5343", "රු. 5343", PUNCTUATION, SIMPLE, S),
        positive("Pos_Fun_0023", "Multiple Spaces", "mama  gedhara   yanavaa", "මම ගෙදර යනවා", "Formatting (spaces / line breaks / paragraph)", SIMPLE, S),
        positive("Pos_Fun_0024", "Slang/Colloquial", "ela machan! supiri!!", "එලා මචන්! සුපිරි!!", SLANG, SIMPLE, S),
        // Expected failures
        negative("Neg_Fun_0001", "Joined Words No Spaces", "mamagedharayanavaa", TYPO, S),
        negative("Neg_Fun_0002", "Mixed Language Ambiguity", "lamayi school yannee vaeen ekee", MIXED, M),
        negative("Neg_Fun_0003", "Incorrect Spelling", "mama gethara yanawa", TYPO, S),
        negative("Neg_Fun_0004", "Very Long Input", "mama ".repeat(150), "Empty/cleared input handling", L),
        negative("Neg_Fun_0005", "Special Characters Only", "!@#$%^&*()", PUNCTUATION, S),
        negative("Neg_Fun_0006", "English Only Text", "Hello how are you", MIXED, S),
        negative("Neg_Fun_0007", "Repeated Words Stress", "hari ".repeat(20), COMBINATION, M),
        negative("Neg_Fun_0008", "Incomplete Sentence", "mama gedhara", DAILY, S),
        negative("Neg_Fun_0009", "Mixed Case Text", "MaMa GeDhArA yAnAvAa", TYPO, S),
        negative("Neg_Fun_0010", "Uncommon Slang", "appatasiri mata beheth bonna", SLANG, M),
        // Real-time UI behavior
        TestCase {
            id: "Pos_UI_0001".to_string(),
            description: "Real-time Sinhala output updates automatically while typing".to_string(),
            input: REALTIME_PHRASE.to_string(),
            expected: "Sinhala output should update automatically while typing".to_string(),
            domain: "Usability flow (real-time conversion)".to_string(),
            grammar: SIMPLE.to_string(),
            length: S,
            intent: Intent::UiRealtime,
        },
    ];

    Corpus { cases }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_meets_minimums() {
        let corpus = builtin();
        assert_eq!(corpus.count_intent(Intent::Positive), 24);
        assert_eq!(corpus.count_intent(Intent::Negative), 10);
        assert_eq!(corpus.count_intent(Intent::UiRealtime), 1);
    }

    #[test]
    fn test_builtin_is_valid() {
        let corpus = builtin();
        assert!(Corpus::new(corpus.cases().to_vec()).is_ok());
    }

    #[test]
    fn test_generated_inputs() {
        let corpus = builtin();
        let long = corpus.cases().iter().find(|c| c.id == "Neg_Fun_0004").unwrap();
        assert_eq!(long.input.len(), 750);
        assert!(long.input.ends_with(' '));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let first = builtin().cases()[0].clone();
        let err = Corpus::new(vec![first.clone(), first]).unwrap_err();
        assert!(matches!(err, Error::DuplicateCase(id) if id == "Pos_Fun_0001"));
    }

    #[test]
    fn test_parse_yaml_corpus() {
        let yaml = r#"
- id: Pos_Fun_0100
  desc: Greeting
  input: aayuboovan
  expected: ආයුබෝවන්
  type: Greeting / request / response
  grammar: Simple sentence
  length: S
  intent: positive
- id: Neg_Fun_0100
  description: Digits only
  input: "12345"
  expected: SHOULD FAIL
  domain: Punctuation / numbers
  grammar: Simple sentence
  length: S
  intent: negative
"#;
        let corpus = Corpus::from_yaml(yaml).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.cases()[0].domain, "Greeting / request / response");
        assert_eq!(corpus.cases()[1].intent, Intent::Negative);
    }

    #[test]
    fn test_order_records() {
        use crate::classify::{Classification, Verdict};
        use std::time::Duration;

        let corpus = builtin();
        let pass = Classification {
            verdict: Verdict::Pass,
            comment: String::new(),
        };
        let mut records: Vec<_> = [34, 3, 25, 0]
            .into_iter()
            .map(|i| ResultRecord::completed(&corpus.cases()[i], "", pass.clone(), Duration::ZERO))
            .collect();
        corpus.order_records(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["Pos_Fun_0001", "Pos_Fun_0004", "Neg_Fun_0002", "Pos_UI_0001"]);
    }

    #[test]
    fn test_filter_prefix() {
        let corpus = builtin().filter_prefix("Neg_");
        assert_eq!(corpus.len(), 10);
    }
}

//! Dictionary sources for the trie tagger.
//!
//! Three sources feed the automaton:
//! - the embedded lexicon (common chemicals, diseases and gene symbols)
//! - TSV lexicon files: `term<TAB>LABEL[<TAB>canonical_id]`, `#` comments
//! - MeSH descriptor XML (`descXXXX.xml`), disease branch only

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

use crate::entity_types::EntityType;
use crate::{NerError, Result};

/// One dictionary term.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    pub term: String,
    pub label: EntityType,
    pub canonical_id: String,
}

impl LexiconEntry {
    pub fn new(term: impl Into<String>, label: EntityType, canonical_id: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            label,
            canonical_id: canonical_id.into(),
        }
    }
}

/// Where to load extra dictionary terms from.
#[derive(Debug, Clone, PartialEq)]
pub enum LexiconSource {
    Tsv(PathBuf),
    MeshDescriptors(PathBuf),
}

impl LexiconSource {
    pub fn load(&self) -> Result<Vec<LexiconEntry>> {
        match self {
            LexiconSource::Tsv(path) => load_tsv(path),
            LexiconSource::MeshDescriptors(path) => load_mesh_diseases(path),
        }
    }
}

/// Load a TSV lexicon from disk.
pub fn load_tsv(path: &Path) -> Result<Vec<LexiconEntry>> {
    let file = File::open(path)
        .map_err(|e| NerError::LexiconLoad(format!("{}: {e}", path.display())))?;
    let entries = parse_tsv(BufReader::new(file))
        .map_err(|e| NerError::LexiconLoad(format!("{}: {e}", path.display())))?;
    info!("Loaded {} lexicon terms from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse TSV lexicon lines. Labels go through strict parsing so a typo in a
/// lexicon fails loudly instead of silently becoming `OTHER`.
pub fn parse_tsv<R: BufRead>(reader: R) -> Result<Vec<LexiconEntry>> {
    let mut entries = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 2 {
            return Err(NerError::InvalidInput(format!(
                "line {}: expected term<TAB>label",
                lineno + 1
            )));
        }
        let term = cols[0].trim();
        if term.is_empty() {
            continue;
        }
        let label: EntityType = cols[1]
            .parse()
            .map_err(|e| NerError::InvalidInput(format!("line {}: {e}", lineno + 1)))?;
        let id = cols.get(2).map(|s| s.trim()).unwrap_or_default();
        entries.push(LexiconEntry::new(term, label, id));
    }
    Ok(entries)
}

/// Parse MeSH XML and extract disease terms (tree numbers starting with `C`).
pub fn load_mesh_diseases(path: &Path) -> Result<Vec<LexiconEntry>> {
    let file = File::open(path)
        .map_err(|e| NerError::LexiconLoad(format!("{}: {e}", path.display())))?;
    let entries = parse_mesh_diseases(BufReader::new(file))?;
    info!("Loaded {} disease terms from MeSH {}", entries.len(), path.display());
    Ok(entries)
}

pub(crate) fn parse_mesh_diseases<R: BufRead>(reader: R) -> Result<Vec<LexiconEntry>> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut current: Option<MeshDescriptorData> = None;
    // DescriptorName/String also appears inside concepts and terms; only the
    // record-level name is wanted.
    let mut depth_in_record = 0usize;
    let mut current_text = String::new();
    let mut buf = Vec::new();
    let mut entries = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"DescriptorRecord" {
                    current = Some(MeshDescriptorData::default());
                    depth_in_record = 0;
                } else if current.is_some() {
                    depth_in_record += 1;
                }
                current_text.clear();
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|err| NerError::LexiconLoad(format!("MeSH XML: {err}")))?;
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if let Some(desc) = current.as_mut() {
                    match name.as_ref() {
                        b"DescriptorUI" if depth_in_record == 1 => {
                            desc.ui = current_text.clone();
                        }
                        b"String" if depth_in_record == 2 && desc.name.is_empty() => {
                            desc.name = current_text.clone();
                        }
                        b"TreeNumber" => {
                            desc.tree_numbers.push(current_text.clone());
                        }
                        _ => {}
                    }
                }
                if name.as_ref() == b"DescriptorRecord" {
                    if let Some(desc) = current.take() {
                        if desc.is_disease() && !desc.name.is_empty() {
                            entries.push(LexiconEntry::new(
                                desc.name,
                                EntityType::Disease,
                                format!("MESH:{}", desc.ui),
                            ));
                        }
                    }
                } else if current.is_some() {
                    depth_in_record = depth_in_record.saturating_sub(1);
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(NerError::LexiconLoad(format!("MeSH XML: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Helper struct for MeSH XML parsing
#[derive(Default)]
struct MeshDescriptorData {
    ui: String,
    name: String,
    tree_numbers: Vec<String>,
}

impl MeshDescriptorData {
    fn is_disease(&self) -> bool {
        self.tree_numbers.iter().any(|t| t.starts_with('C'))
    }
}

/// The built-in dictionary: common chemicals, drugs, diseases and gene symbols.
pub(crate) fn embedded() -> Vec<LexiconEntry> {
    let mut out = Vec::new();

    let chemicals = [
        ("cisplatin", "CHEMBL11359"),
        ("carboplatin", "CHEMBL1351"),
        ("oxaliplatin", "CHEMBL414804"),
        ("paclitaxel", "CHEMBL428647"),
        ("docetaxel", "CHEMBL92"),
        ("doxorubicin", "CHEMBL53463"),
        ("gemcitabine", "CHEMBL888"),
        ("5-fluorouracil", "CHEMBL185"),
        ("capecitabine", "CHEMBL1773"),
        ("methotrexate", "CHEMBL34259"),
        ("cyclophosphamide", "CHEMBL88"),
        ("vincristine", "CHEMBL303560"),
        ("etoposide", "CHEMBL44657"),
        ("irinotecan", "CHEMBL481"),
        ("imatinib", "CHEMBL941"),
        ("gefitinib", "CHEMBL939"),
        ("erlotinib", "CHEMBL553"),
        ("lapatinib", "CHEMBL554"),
        ("osimertinib", "CHEMBL3353410"),
        ("sorafenib", "CHEMBL1336"),
        ("sunitinib", "CHEMBL535"),
        ("tamoxifen", "CHEMBL83"),
        ("aspirin", "CHEMBL25"),
        ("acetaminophen", "CHEMBL112"),
        ("paracetamol", "CHEMBL112"),
        ("ibuprofen", "CHEMBL521"),
        ("naproxen", "CHEMBL154"),
        ("morphine", "CHEMBL70"),
        ("codeine", "CHEMBL485"),
        ("caffeine", "CHEMBL113"),
        ("nicotine", "CHEMBL3"),
        ("ethanol", "CHEMBL545"),
        ("glucose", "CHEBI:17234"),
        ("insulin", "CHEMBL1201631"),
        ("metformin", "CHEMBL1431"),
        ("warfarin", "CHEMBL1464"),
        ("heparin", "CHEMBL1909300"),
        ("dexamethasone", "CHEMBL384467"),
        ("prednisone", "CHEMBL635"),
        ("hydrocortisone", "CHEMBL389621"),
        ("cortisol", "CHEMBL389621"),
        ("penicillin", "CHEBI:17334"),
        ("amoxicillin", "CHEMBL1082"),
        ("vancomycin", "CHEMBL262777"),
        ("ciprofloxacin", "CHEMBL8"),
        ("lithium", "CHEBI:30145"),
        ("haloperidol", "CHEMBL54"),
        ("cocaine", "CHEMBL370805"),
        ("dopamine", "CHEMBL59"),
        ("serotonin", "CHEMBL39"),
        ("lidocaine", "CHEMBL79"),
        ("nitric oxide", "CHEBI:16480"),
        ("hydrogen peroxide", "CHEBI:16240"),
        ("cholesterol", "CHEBI:16113"),
        ("atorvastatin", "CHEMBL1487"),
        ("simvastatin", "CHEMBL1064"),
        ("streptozotocin", "CHEMBL1651906"),
        ("cyclosporine", "CHEMBL160"),
        ("tacrolimus", "CHEMBL269732"),
        ("valproic acid", "CHEMBL109"),
        ("phenytoin", "CHEMBL16"),
        ("carbamazepine", "CHEMBL108"),
        ("amiodarone", "CHEMBL633"),
        ("digoxin", "CHEMBL1751"),
        ("propranolol", "CHEMBL27"),
        ("furosemide", "CHEMBL35"),
        ("captopril", "CHEMBL1560"),
        ("nifedipine", "CHEMBL193"),
    ];
    for (term, id) in chemicals {
        out.push(LexiconEntry::new(term, EntityType::Chemical, id));
    }

    let diseases = [
        ("cancer", "MESH:D009369"),
        ("tumor", "MESH:D009369"),
        ("tumour", "MESH:D009369"),
        ("carcinoma", "MESH:D002277"),
        ("adenocarcinoma", "MESH:D000230"),
        ("sarcoma", "MESH:D012509"),
        ("melanoma", "MESH:D008545"),
        ("lymphoma", "MESH:D008223"),
        ("leukemia", "MESH:D007938"),
        ("leukaemia", "MESH:D007938"),
        ("glioma", "MESH:D005910"),
        ("breast cancer", "MESH:D001943"),
        ("lung cancer", "MESH:D008175"),
        ("colorectal cancer", "MESH:D015179"),
        ("prostate cancer", "MESH:D011471"),
        ("pancreatic cancer", "MESH:D010190"),
        ("ovarian cancer", "MESH:D010051"),
        ("multiple myeloma", "MESH:D009101"),
        ("diabetes", "MESH:D003920"),
        ("diabetes mellitus", "MESH:D003920"),
        ("hypertension", "MESH:D006973"),
        ("hypotension", "MESH:D007022"),
        ("asthma", "MESH:D001249"),
        ("pneumonia", "MESH:D011014"),
        ("sepsis", "MESH:D018805"),
        ("hepatitis", "MESH:D006505"),
        ("cirrhosis", "MESH:D008103"),
        ("hepatotoxicity", "MESH:D056486"),
        ("nephrotoxicity", "MESH:D007674"),
        ("cardiotoxicity", "MESH:D066126"),
        ("neurotoxicity", "MESH:D020258"),
        ("arrhythmia", "MESH:D001145"),
        ("myocardial infarction", "MESH:D009203"),
        ("heart failure", "MESH:D006333"),
        ("stroke", "MESH:D020521"),
        ("seizure", "MESH:D012640"),
        ("seizures", "MESH:D012640"),
        ("epilepsy", "MESH:D004827"),
        ("alzheimer's disease", "MESH:D000544"),
        ("parkinson's disease", "MESH:D010300"),
        ("schizophrenia", "MESH:D012559"),
        ("depression", "MESH:D003866"),
        ("anxiety", "MESH:D001007"),
        ("obesity", "MESH:D009765"),
        ("inflammation", "MESH:D007249"),
        ("infection", "MESH:D007239"),
        ("tuberculosis", "MESH:D014376"),
        ("malaria", "MESH:D008288"),
        ("hiv infection", "MESH:D015658"),
        ("anemia", "MESH:D000740"),
        ("thrombosis", "MESH:D013927"),
        ("pain", "MESH:D010146"),
        ("fever", "MESH:D005334"),
        ("nausea", "MESH:D009325"),
        ("headache", "MESH:D006261"),
        ("proteinuria", "MESH:D011507"),
        ("renal failure", "MESH:D051437"),
        ("liver injury", "MESH:D056486"),
        ("arthritis", "MESH:D001168"),
        ("psoriasis", "MESH:D011565"),
    ];
    for (term, id) in diseases {
        out.push(LexiconEntry::new(term, EntityType::Disease, id));
    }

    // Gene symbols are matched case-sensitively.
    let genes = [
        ("KRAS", "HGNC:6407"),
        ("TP53", "HGNC:11998"),
        ("EGFR", "HGNC:3236"),
        ("BRCA1", "HGNC:1100"),
        ("BRCA2", "HGNC:1101"),
        ("MYC", "HGNC:7553"),
        ("PIK3CA", "HGNC:8975"),
        ("PTEN", "HGNC:9588"),
        ("BRAF", "HGNC:1097"),
        ("NRAS", "HGNC:7989"),
        ("AKT1", "HGNC:391"),
        ("MTOR", "HGNC:3942"),
        ("CDKN2A", "HGNC:1787"),
        ("RB1", "HGNC:9884"),
        ("ATM", "HGNC:795"),
        ("APC", "HGNC:583"),
        ("ALK", "HGNC:427"),
        ("ERBB2", "HGNC:3430"),
        ("HER2", "HGNC:3430"),
        ("CYP3A4", "HGNC:2637"),
        ("CYP2D6", "HGNC:2625"),
    ];
    for (symbol, id) in genes {
        out.push(LexiconEntry::new(symbol, EntityType::Gene, id));
    }

    out
}

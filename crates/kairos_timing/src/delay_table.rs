//! Logic and intra-site delay lookup tables.
//!
//! A [`DelayTables`] is built once from `intrasite_delay_terms.txt` and is
//! read-only afterwards. Queries distinguish three outcomes:
//!
//! - `Ok(Some(delay))`: the arc exists (a delay of 0 is a real delay);
//! - `Ok(None)`: the scope is known but the arc is absent;
//! - `Err(LookupError)`: the scope or a configuration value is unknown.

use crate::delay_text::{parse_blocks, Block, BlockKind, OptionList};
use crate::error::{DataError, LookupError};
use kairos_common::ContentHash;
use std::collections::HashMap;
use std::path::Path;

/// Pin-pair map nested by source then destination, so lookups borrow `&str`.
type ArcMap<V> = HashMap<String, HashMap<String, V>>;

const BUILTIN_BEL_SCOPES: &[(&str, u32)] = &[
    ("CARRY8", 0),
    ("A6LUT", 1),
    ("B6LUT", 1),
    ("C6LUT", 1),
    ("D6LUT", 1),
    ("E6LUT", 1),
    ("F6LUT", 1),
    ("G6LUT", 1),
    ("H6LUT", 1),
    ("A5LUT", 2),
    ("B5LUT", 2),
    ("C5LUT", 2),
    ("D5LUT", 2),
    ("E5LUT", 2),
    ("F5LUT", 2),
    ("G5LUT", 2),
    ("H5LUT", 2),
    ("AFF", 3),
    ("AFF2", 3),
    ("BFF", 3),
    ("BFF2", 3),
    ("CFF", 3),
    ("CFF2", 3),
    ("DFF", 3),
    ("DFF2", 3),
    ("EFF", 3),
    ("EFF2", 3),
    ("FFF", 3),
    ("FFF2", 3),
    ("GFF", 3),
    ("GFF2", 3),
    ("HFF", 3),
    ("HFF2", 3),
    ("F7MUX_AB", 4),
    ("F7MUX_CD", 4),
    ("F7MUX_EF", 4),
    ("F7MUX_GH", 4),
];

const BUILTIN_SITE_SCOPES: &[(&str, u32)] = &[("SLICEL", 0), ("SLICEM", 0)];

/// One configuration alternative of a logic arc.
#[derive(Debug, Clone, Copy)]
struct ConfiguredDelay {
    mask: u64,
    delay: i16,
}

/// Name-to-id mapping for one scope namespace.
#[derive(Debug, Clone)]
struct ScopeIndex {
    ids: HashMap<String, u32>,
    next: u32,
}

impl ScopeIndex {
    fn with_builtins(builtins: &[(&str, u32)]) -> Self {
        let ids: HashMap<String, u32> = builtins
            .iter()
            .map(|&(name, id)| (name.to_string(), id))
            .collect();
        let next = ids.values().max().map_or(0, |m| m + 1);
        Self { ids, next }
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    /// Resolves a header's names to one id, registering unknown names.
    fn register(&mut self, names: &[String]) -> u32 {
        let id = match names.iter().find_map(|n| self.get(n)) {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        };
        for name in names {
            self.ids.entry(name.clone()).or_insert(id);
        }
        id
    }
}

/// Logic and intra-site delay tables for one device series.
#[derive(Debug, Clone)]
pub struct DelayTables {
    bel_scopes: ScopeIndex,
    site_scopes: ScopeIndex,
    /// Per scope: `"NAME:VALUE"` to its one-hot code.
    config_codes: HashMap<u32, HashMap<String, u64>>,
    logic: HashMap<u32, ArcMap<Vec<ConfiguredDelay>>>,
    intra_site: HashMap<u32, ArcMap<i16>>,
    logic_entries: usize,
    intra_site_entries: usize,
    hash: ContentHash,
}

impl DelayTables {
    fn empty(hash: ContentHash) -> Self {
        Self {
            bel_scopes: ScopeIndex::with_builtins(BUILTIN_BEL_SCOPES),
            site_scopes: ScopeIndex::with_builtins(BUILTIN_SITE_SCOPES),
            config_codes: HashMap::new(),
            logic: HashMap::new(),
            intra_site: HashMap::new(),
            logic_entries: 0,
            intra_site_entries: 0,
            hash,
        }
    }

    /// Reads and parses a delay table file.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text, path)
    }

    /// Parses delay table text. `origin` names the source in error messages.
    pub fn from_text(text: &str, origin: impl AsRef<Path>) -> Result<Self, DataError> {
        let origin = origin.as_ref();
        let blocks = parse_blocks(text, origin)?;
        let mut tables = Self::empty(ContentHash::from_bytes(text.as_bytes()));
        for block in &blocks {
            match block.kind {
                BlockKind::Bel => tables.add_bel_block(block, origin)?,
                BlockKind::Site => tables.add_site_block(block, origin)?,
            }
        }
        log::debug!(
            "loaded {} logic and {} intra-site delay entries from {}",
            tables.logic_entries,
            tables.intra_site_entries,
            origin.display()
        );
        Ok(tables)
    }

    fn add_bel_block(&mut self, block: &Block, origin: &Path) -> Result<(), DataError> {
        let scope = self.bel_scopes.register(&block.names);
        let codes = self.config_codes.entry(scope).or_default();
        for option in &block.configs {
            for value in &option.values {
                let key = format!("{}:{}", option.name, value);
                if codes.contains_key(&key) {
                    continue;
                }
                if codes.len() >= 64 {
                    return Err(DataError::TooManyConfigValues {
                        path: origin.to_path_buf(),
                        line: block.line,
                        scope: block.names[0].clone(),
                    });
                }
                let bit = 1u64 << codes.len();
                codes.insert(key, bit);
            }
        }

        let codes = &self.config_codes[&scope];
        let arcs = self.logic.entry(scope).or_default();
        for arc in &block.arcs {
            let mask = arc_mask(codes, &block.configs, &arc.options).map_err(|message| {
                DataError::Parse {
                    path: origin.to_path_buf(),
                    line: arc.line,
                    message,
                }
            })?;
            for from in &arc.sources {
                for to in &arc.sinks {
                    arcs.entry(from.clone())
                        .or_default()
                        .entry(to.clone())
                        .or_default()
                        .push(ConfiguredDelay {
                            mask,
                            delay: arc.delay,
                        });
                    self.logic_entries += 1;
                }
            }
        }
        Ok(())
    }

    fn add_site_block(&mut self, block: &Block, origin: &Path) -> Result<(), DataError> {
        let scope = self.site_scopes.register(&block.names);
        let arcs = self.intra_site.entry(scope).or_default();
        for arc in &block.arcs {
            let mut pairs = Vec::new();
            for from in &arc.sources {
                for to in &arc.sinks {
                    match arc.options.first() {
                        None => pairs.push((from.clone(), to.clone())),
                        Some(key) => {
                            for value in &key.values {
                                pairs.push((
                                    from.replace(&key.name, value),
                                    to.replace(&key.name, value),
                                ));
                            }
                        }
                    }
                }
            }
            for (from, to) in pairs {
                let dsts = arcs.entry(from.clone()).or_default();
                if dsts.contains_key(&to) {
                    return Err(DataError::DuplicateEntry {
                        path: origin.to_path_buf(),
                        line: arc.line,
                        scope: block.names[0].clone(),
                        from,
                        to,
                    });
                }
                dsts.insert(to, arc.delay);
                self.intra_site_entries += 1;
            }
        }
        Ok(())
    }

    /// Looks up the delay of a BEL arc under a configuration.
    ///
    /// `config` holds `"NAME:VALUE"` strings; an empty slice matches the
    /// first alternative stored for the arc.
    pub fn logic_delay(
        &self,
        bel: &str,
        from: &str,
        to: &str,
        config: &[&str],
    ) -> Result<Option<i16>, LookupError> {
        let scope = self
            .bel_scopes
            .get(bel)
            .ok_or_else(|| LookupError::UnknownScope(bel.to_string()))?;

        let mut encoded = 0u64;
        if !config.is_empty() {
            let codes = self.config_codes.get(&scope);
            for &c in config {
                let code = codes.and_then(|m| m.get(c)).ok_or_else(|| {
                    LookupError::UnknownConfig {
                        scope: bel.to_string(),
                        config: c.to_string(),
                    }
                })?;
                encoded |= code;
            }
        }

        Ok(self
            .logic
            .get(&scope)
            .and_then(|arcs| arcs.get(from))
            .and_then(|dsts| dsts.get(to))
            .and_then(|alts| alts.iter().find(|a| a.mask & encoded == encoded))
            .map(|a| a.delay))
    }

    /// Looks up the delay between two pins inside a site.
    pub fn intra_site_delay(
        &self,
        site_type: &str,
        from: &str,
        to: &str,
    ) -> Result<Option<i16>, LookupError> {
        let scope = self
            .site_scopes
            .get(site_type)
            .ok_or_else(|| LookupError::UnknownScope(site_type.to_string()))?;
        Ok(self
            .intra_site
            .get(&scope)
            .and_then(|arcs| arcs.get(from))
            .and_then(|dsts| dsts.get(to))
            .copied())
    }

    /// The scope id of a BEL name, if known.
    pub fn bel_scope(&self, bel: &str) -> Option<u32> {
        self.bel_scopes.get(bel)
    }

    /// The scope id of a site type, if known.
    pub fn site_scope(&self, site_type: &str) -> Option<u32> {
        self.site_scopes.get(site_type)
    }

    /// Number of stored logic arcs, counting each configuration alternative.
    pub fn logic_entry_count(&self) -> usize {
        self.logic_entries
    }

    /// Number of stored intra-site arcs.
    pub fn intra_site_entry_count(&self) -> usize {
        self.intra_site_entries
    }

    /// Hash of the text the tables were parsed from.
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }
}

/// Computes an arc's configuration mask.
///
/// Options the arc does not mention are don't-care: all of their declared
/// values are OR-ed in. An arc with no options matches every configuration.
fn arc_mask(
    codes: &HashMap<String, u64>,
    declared: &[OptionList],
    listed: &[OptionList],
) -> Result<u64, String> {
    if listed.is_empty() {
        return Ok(u64::MAX);
    }
    let mut mask = 0u64;
    for option in listed {
        if !declared.iter().any(|d| d.name == option.name) {
            return Err(format!("unknown configuration name '{}:'", option.name));
        }
        for value in &option.values {
            let key = format!("{}:{}", option.name, value);
            let code = codes
                .get(&key)
                .ok_or_else(|| format!("unknown configuration value '{key}'"))?;
            mask |= code;
        }
    }
    for option in declared {
        if listed.iter().any(|l| l.name == option.name) {
            continue;
        }
        for value in &option.values {
            if let Some(code) = codes.get(&format!("{}:{}", option.name, value)) {
                mask |= code;
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
bel CARRY8 CYINIT_BOT: GND CIN CARRY_TYPE: SINGLE_CY8 DUAL_CY4
AX CO7 98 CYINIT_BOT: GND
AX CO7 120 CYINIT_BOT: CIN
S0 O0 45
bel A6LUT,B6LUT
A1 O6 150
A6 O6 0
site SLICEL,SLICEM
AQ AFF/Q 0
KEY6LUT/O6 KEYFF/D 48 KEY: A B
";

    fn tables() -> DelayTables {
        DelayTables::from_text(SAMPLE, "sample.txt").unwrap()
    }

    #[test]
    fn carry_config_selects_alternative() {
        let t = tables();
        let gnd = t.logic_delay("CARRY8", "AX", "CO7", &["CYINIT_BOT:GND"]);
        let cin = t.logic_delay("CARRY8", "AX", "CO7", &["CYINIT_BOT:CIN"]);
        assert_eq!(gnd, Ok(Some(98)));
        assert_eq!(cin, Ok(Some(120)));
    }

    #[test]
    fn dont_care_options_match_any_value() {
        let t = tables();
        let d = t.logic_delay(
            "CARRY8",
            "AX",
            "CO7",
            &["CYINIT_BOT:CIN", "CARRY_TYPE:DUAL_CY4"],
        );
        assert_eq!(d, Ok(Some(120)));
    }

    #[test]
    fn empty_config_matches_first_entry() {
        let t = tables();
        assert_eq!(t.logic_delay("CARRY8", "AX", "CO7", &[]), Ok(Some(98)));
        assert_eq!(t.logic_delay("CARRY8", "S0", "O0", &[]), Ok(Some(45)));
    }

    #[test]
    fn equivalent_bels_share_scope() {
        let t = tables();
        assert_eq!(t.bel_scope("A6LUT"), Some(1));
        assert_eq!(t.logic_delay("H6LUT", "A1", "O6", &[]), Ok(Some(150)));
        assert_eq!(t.logic_delay("B6LUT", "A1", "O6", &[]), Ok(Some(150)));
    }

    #[test]
    fn zero_delay_is_not_absent() {
        let t = tables();
        assert_eq!(t.logic_delay("A6LUT", "A6", "O6", &[]), Ok(Some(0)));
        assert_eq!(t.logic_delay("A6LUT", "A2", "O6", &[]), Ok(None));
    }

    #[test]
    fn known_scope_without_data_is_absent() {
        let t = tables();
        assert_eq!(t.logic_delay("AFF", "D", "Q", &[]), Ok(None));
    }

    #[test]
    fn unknown_scope_is_error() {
        let t = tables();
        assert_eq!(
            t.logic_delay("DSP48E2", "A", "P", &[]),
            Err(LookupError::UnknownScope("DSP48E2".into()))
        );
        assert!(t.intra_site_delay("RAMB36", "A", "B").is_err());
    }

    #[test]
    fn unknown_config_in_query_is_error() {
        let t = tables();
        let err = t
            .logic_delay("CARRY8", "AX", "CO7", &["CYINIT_BOT:VCC"])
            .unwrap_err();
        assert!(matches!(err, LookupError::UnknownConfig { .. }));
    }

    #[test]
    fn intra_site_key_substitution() {
        let t = tables();
        assert_eq!(t.intra_site_delay("SLICEL", "A6LUT/O6", "AFF/D"), Ok(Some(48)));
        assert_eq!(t.intra_site_delay("SLICEM", "B6LUT/O6", "BFF/D"), Ok(Some(48)));
        assert_eq!(t.intra_site_delay("SLICEL", "C6LUT/O6", "CFF/D"), Ok(None));
        assert_eq!(t.intra_site_delay("SLICEL", "AQ", "AFF/Q"), Ok(Some(0)));
    }

    #[test]
    fn entry_counts() {
        let t = tables();
        assert_eq!(t.logic_entry_count(), 5);
        assert_eq!(t.intra_site_entry_count(), 3);
    }

    #[test]
    fn unknown_config_on_arc_is_error() {
        let text = "bel CARRY8 CYINIT_BOT: GND CIN\nAX CO7 98 CYINIT_TOP: GND\n";
        let err = DelayTables::from_text(text, "bad.txt").unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 2, .. }));

        let text = "bel CARRY8 CYINIT_BOT: GND CIN\nAX CO7 98 CYINIT_BOT: VCC\n";
        let err = DelayTables::from_text(text, "bad.txt").unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 2, .. }));
    }

    #[test]
    fn duplicate_intra_site_entry_is_error() {
        let text = "site SLICEL\nAQ AFF/Q 0\nAQ AFF/Q 5\n";
        let err = DelayTables::from_text(text, "dup.txt").unwrap_err();
        match err {
            DataError::DuplicateEntry {
                line, scope, from, ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(scope, "SLICEL");
                assert_eq!(from, "AQ");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn too_many_config_values() {
        let values: Vec<String> = (0..65).map(|i| format!("V{i}")).collect();
        let text = format!("bel WIDE MODE: {}\n", values.join(" "));
        let err = DelayTables::from_text(&text, "wide.txt").unwrap_err();
        assert!(matches!(err, DataError::TooManyConfigValues { .. }));
    }

    #[test]
    fn new_scopes_get_fresh_ids() {
        let t = DelayTables::from_text("bel DSP_ALU\nA O 10\nsite DSP\nA B 1\n", "x").unwrap();
        assert_eq!(t.bel_scope("DSP_ALU"), Some(5));
        assert_eq!(t.site_scope("DSP"), Some(1));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DelayTables::load(Path::new("/nonexistent/intrasite.txt")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn content_hash_tracks_text() {
        let a = tables();
        let b = DelayTables::from_text(&format!("{SAMPLE}# v2\n"), "x").unwrap();
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), tables().content_hash());
    }
}

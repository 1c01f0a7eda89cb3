use once_cell::sync::Lazy;
use std::collections::HashMap;

const BUNDLED_ISO3166: &str = include_str!("../../../data/iso3166.tsv");

static BUNDLED: Lazy<IsoCountryTable> = Lazy::new(|| IsoCountryTable::parse(BUNDLED_ISO3166));

/// Country name → ISO 3166-1 alpha-3 lookup used by the geo map
pub trait CountryCodeResolver {
    /// `None` when the name is not recognised
    fn resolve(&self, name: &str) -> Option<String>;
}

/// Explicit name → code table; keys match exactly
impl CountryCodeResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name.trim()).cloned()
    }
}

/// Case-insensitive ISO 3166 table.
///
/// A country matches on its alpha-2 code, alpha-3 code, short name, official
/// name and a handful of common aliases ("UK", "Russia", "South Korea").
#[derive(Debug, Clone, Default)]
pub struct IsoCountryTable {
    by_name: HashMap<String, String>,
}

impl IsoCountryTable {
    /// Table compiled into the binary
    pub fn bundled() -> &'static IsoCountryTable {
        &BUNDLED
    }

    /// Parse tab-separated rows `alpha_2 alpha_3 name official_name aliases`,
    /// aliases separated by `|`. Blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> Self {
        let mut by_name = HashMap::new();
        let mut skipped = 0usize;

        for line in source.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let alpha_2 = fields.next().unwrap_or_default().trim();
            let alpha_3 = fields.next().unwrap_or_default().trim();
            if alpha_3.len() != 3 {
                skipped += 1;
                continue;
            }
            let name = fields.next().unwrap_or_default();
            let official = fields.next().unwrap_or_default();
            let aliases = fields.next().unwrap_or_default();

            let names = [alpha_2, alpha_3, name, official]
                .into_iter()
                .chain(aliases.split('|'));
            for candidate in names {
                let key = normalize_name(candidate);
                if key.is_empty() {
                    continue;
                }
                // first row claiming a name keeps it
                by_name.entry(key).or_insert_with(|| alpha_3.to_string());
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} malformed country table rows", skipped);
        }

        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl CountryCodeResolver for IsoCountryTable {
    fn resolve(&self, name: &str) -> Option<String> {
        self.by_name.get(&normalize_name(name)).cloned()
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

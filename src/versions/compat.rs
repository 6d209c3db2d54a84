// Compatibility ranges between mod builds, server versions and client versions

use super::Namespace;
use super::store::VersionStore;
use std::collections::{HashMap, HashSet};

/// Versioning schemes, in resolution order: a mod build targets server
/// versions, and a server version range maps to client versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    ModBuild,
    Server,
    Client,
}

/// Two chained lookup tables: mod build → server range token, and server
/// range token → client range token.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityMapping {
    mod_to_server: HashMap<String, String>,
    server_to_client: HashMap<String, String>,
}

lazy_static::lazy_static! {
    static ref BUILTIN: CompatibilityMapping = CompatibilityMapping::builtin_table();
}

impl CompatibilityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the tool.
    pub fn builtin() -> &'static CompatibilityMapping {
        &BUILTIN
    }

    fn builtin_table() -> Self {
        let mut m = Self::new();

        for build in 27..64 {
            m.map_mod(&format!("hmod{}", build), "0.1.4");
        }
        m.map_server("0.1.4", "a1.0.17-a1.0.17_04");

        for build in 64..123 {
            m.map_mod(&format!("hmod{}", build), "0.2.0_1-0.2.1");
        }
        m.map_server("0.2.0_1-0.2.1", "a1.1.0-a1.1.2_01");

        m.map_mod("hmod123", "0.2.2_01-0.2.3");
        m.map_mod("hmod124", "0.2.2_01-0.2.3");
        m.map_server("0.2.2_01-0.2.3", "a1.2.0-a1.2.1_01");

        m.map_mod("hmod125", "0.2.4");
        m.map_server("0.2.4", "a1.2.2");

        for build in ["hmod126", "hmod127", "hmod128"] {
            m.map_mod(build, "0.2.5-0.2.5_02");
        }
        m.map_server("0.2.5-0.2.5_02", "a1.2.3-a1.2.3_04");

        m.map_mod("hmod129", "0.2.6_02");
        m.map_mod("hmod130", "0.2.6_02");
        m.map_server("0.2.6_02", "a1.2.4_01-a1.2.6");

        m.map_mod("hmod131", "0.2.7-0.2.8");
        m.map_server("0.2.7-0.2.8", "a1.2.4_01-a1.2.6");

        // Beta-era builds name the client directly.
        m.map_mod("hmod132", "b1.1_02");
        m.map_mod("hmod133", "b1.1_02");

        m
    }

    pub fn map_mod(&mut self, mod_build: &str, server_token: &str) -> &mut Self {
        self.mod_to_server
            .insert(mod_build.to_string(), server_token.to_string());
        self
    }

    pub fn map_server(&mut self, server_token: &str, client_token: &str) -> &mut Self {
        self.server_to_client
            .insert(server_token.to_string(), client_token.to_string());
        self
    }

    /// Range token in `target` for `source_id` in `source`. `None` when there is
    /// no mapping or the direction is not forward (mod → server → client).
    ///
    /// When the server → client hop is missing, the server token stands in.
    pub fn range_token(&self, source: Scheme, source_id: &str, target: Scheme) -> Option<String> {
        if source >= target {
            return None;
        }
        let id = normalize_id(source, source_id)?;
        let server_token = match source {
            Scheme::ModBuild => self.mod_to_server.get(&id)?.clone(),
            Scheme::Server => id,
            Scheme::Client => return None,
        };
        if target == Scheme::Server {
            return Some(server_token);
        }
        Some(
            self.server_to_client
                .get(&server_token)
                .cloned()
                .unwrap_or(server_token),
        )
    }

    /// Target-scheme ids compatible with `source_id`, in the store's recency
    /// order. Pure: the same inputs against an unchanged store give the same list.
    pub fn compatible_identifiers(
        &self,
        store: &VersionStore,
        source: Scheme,
        source_id: &str,
        target: Scheme,
    ) -> Vec<String> {
        let Some(token) = self.range_token(source, source_id, target) else {
            return Vec::new();
        };
        let fragments: Vec<&str> = token
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();

        candidates(store, target)
            .into_iter()
            .filter(|candidate| fragments.iter().any(|f| fragment_matches(f, candidate)))
            .collect()
    }
}

/// Canonical form of an id in `scheme`. Mod builds accept "hmod27",
/// "hmod 27", "HMOD27" and a bare "27".
pub(crate) fn normalize_id(scheme: Scheme, raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if scheme != Scheme::ModBuild {
        return Some(trimmed.to_string());
    }

    let mut id = trimmed.to_ascii_lowercase();
    let parts: Vec<&str> = id.split_whitespace().collect();
    if parts.len() > 1 {
        id = format!("hmod{}", parts[1]);
    }
    if !id.starts_with("hmod") && id.chars().all(|c| c.is_ascii_digit()) {
        id = format!("hmod{}", id);
    }
    Some(id)
}

/// Ids a target scheme can resolve to: primary versions for clients, the
/// distinct server versions declared by mod records for servers.
fn candidates(store: &VersionStore, target: Scheme) -> Vec<String> {
    match target {
        Scheme::Client => store.sorted_ids(Namespace::Primary),
        Scheme::Server => {
            let mut seen = HashSet::new();
            store
                .list_sorted_by_recency(Namespace::Mod)
                .into_iter()
                .flat_map(|r| r.server_versions.iter().flatten())
                .filter(|v| seen.insert(v.as_str()))
                .cloned()
                .collect()
        }
        Scheme::ModBuild => store.sorted_ids(Namespace::Mod),
    }
}

/// Exact match; or an inclusive `min-max` range; or, without a hyphen, a prefix.
pub fn fragment_matches(fragment: &str, candidate: &str) -> bool {
    if fragment == candidate {
        return true;
    }
    if let Some((min, max)) = fragment.split_once('-') {
        return in_range_inclusive(candidate, min.trim(), max.trim());
    }
    candidate.starts_with(fragment)
}

fn in_range_inclusive(candidate: &str, min: &str, max: &str) -> bool {
    match (
        ParsedVersion::parse(candidate),
        ParsedVersion::parse(min),
        ParsedVersion::parse(max),
    ) {
        (Some(v), Some(lo), Some(hi)) => lo <= v && v <= hi,
        _ => false,
    }
}

/// `(prefix letter, major, minor, patch, patch revision)`, compared in that order.
/// `a1.2.1_01` parses to `('a', 1, 2, 1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedVersion {
    prefix: Option<char>,
    major: u32,
    minor: u32,
    patch: u32,
    revision: u32,
}

impl ParsedVersion {
    /// Non-numeric residue in a field reads as 0; only an empty string fails.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let first = s.chars().next()?;
        let (prefix, rest) = if first.is_alphabetic() {
            (Some(first), &s[first.len_utf8()..])
        } else {
            (None, s)
        };

        let (main, revision) = match rest.split_once('_') {
            Some((main, rev)) => (main, parse_lenient(rev)),
            None => (rest, 0),
        };

        let mut nums = main.split('.');
        Some(Self {
            prefix,
            major: nums.next().map(parse_lenient).unwrap_or(0),
            minor: nums.next().map(parse_lenient).unwrap_or(0),
            patch: nums.next().map(parse_lenient).unwrap_or(0),
            revision,
        })
    }
}

fn parse_lenient(field: &str) -> u32 {
    let digits: String = field.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

//! Occupation-school matcher: ranks schools by how well their outcomes fit one
//! occupation code, enriched with each school's concentrations.
//!
//! Pipeline (stateless, every call refetches):
//! 1. resolve the occupation by code from the full occupation list
//! 2. page through match stats until a short page or the result cap
//! 3. fetch the school roster and index concentrations by school id
//! 4. attach a 2-decimal score and concentrations to each record
//! 5. stable sort by score descending, truncate to the cap
//!
//! Network failures never escape: the affected stage degrades to empty.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::matching::directory::SchoolDirectory;
use crate::models::{EnrichedSekolah, Konsentrasi, MatchRecord, Okupasi, Sekolah};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    /// Records requested per stats page.
    pub page_size: usize,
    /// `limit` sent to the roster endpoint.
    pub roster_limit: usize,
}

impl From<&Config> for MatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.match_page_size,
            roster_limit: config.roster_limit,
        }
    }
}

/// What the search screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub result: Vec<EnrichedSekolah>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_okupasi: Option<Okupasi>,
}

impl MatchOutcome {
    /// Name of the resolved occupation, or `""` when the code is unknown.
    pub fn okupasi_name(&self) -> &str {
        self.selected_okupasi
            .as_ref()
            .map(|o| o.nama.as_str())
            .unwrap_or("")
    }
}

pub async fn match_schools(
    directory: &dyn SchoolDirectory,
    kode: &str,
    name_filter: Option<&str>,
    result_cap: usize,
    settings: MatchSettings,
) -> MatchOutcome {
    info!("Matching schools for okupasi {kode} (cap {result_cap})");

    let selected_okupasi = resolve_okupasi(directory, kode).await;

    if result_cap == 0 {
        return MatchOutcome {
            result: Vec::new(),
            selected_okupasi,
        };
    }

    let records = collect_match_records(directory, kode, name_filter, result_cap, settings).await;
    if records.is_empty() {
        info!("No match records for okupasi {kode}");
        return MatchOutcome {
            result: Vec::new(),
            selected_okupasi,
        };
    }

    let index = match directory
        .sekolah_roster(name_filter, settings.roster_limit)
        .await
    {
        Ok(roster) => konsentrasi_index(roster),
        Err(e) => {
            warn!("School roster unavailable, concentrations left empty: {e}");
            HashMap::new()
        }
    };

    let outcome = MatchOutcome {
        result: rank(enrich(records, &index), result_cap),
        selected_okupasi,
    };
    info!(
        "Matched {} schools for okupasi {kode} ({:?})",
        outcome.result.len(),
        outcome.okupasi_name()
    );
    outcome
}

async fn resolve_okupasi(directory: &dyn SchoolDirectory, kode: &str) -> Option<Okupasi> {
    match directory.okupasi_list().await {
        Ok(list) => {
            let found = list.into_iter().find(|o| o.kode == kode);
            if found.is_none() {
                debug!("Okupasi {kode} not in occupation list");
            }
            found
        }
        Err(e) => {
            warn!("Occupation list unavailable: {e}");
            None
        }
    }
}

/// Fetches stats pages in order until a page comes back shorter than the
/// page size or `cap` records have been accumulated. A failing page ends the
/// loop and keeps what was already collected.
async fn collect_match_records(
    directory: &dyn SchoolDirectory,
    kode: &str,
    name_filter: Option<&str>,
    cap: usize,
    settings: MatchSettings,
) -> Vec<MatchRecord> {
    let page_size = settings.page_size.max(1);
    let mut records: Vec<MatchRecord> = Vec::new();
    let mut page = 1;

    loop {
        let batch = match directory.match_page(kode, name_filter, page_size, page).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    "Match stats page {page} for okupasi {kode} failed, keeping {} records: {e}",
                    records.len()
                );
                break;
            }
        };

        let short_page = batch.len() < page_size;
        records.extend(batch);
        debug!("Page {page}: {} records accumulated", records.len());

        if short_page || records.len() >= cap {
            break;
        }
        page += 1;
    }

    records
}

fn konsentrasi_index(roster: Vec<Sekolah>) -> HashMap<String, Vec<Konsentrasi>> {
    roster
        .into_iter()
        .map(|s| (s.id.key(), s.konsentrasi))
        .collect()
}

fn enrich(
    records: Vec<MatchRecord>,
    index: &HashMap<String, Vec<Konsentrasi>>,
) -> Vec<EnrichedSekolah> {
    records
        .into_iter()
        .map(|record| {
            let mut extra = record.extra;
            extra.remove("konsentrasi");
            EnrichedSekolah {
                kecocokan: format_score(&record.kecocokan),
                konsentrasi: index.get(&record.id.key()).cloned().unwrap_or_default(),
                id: record.id,
                nama: record.nama,
                kota: record.kota,
                jumlah_siswa: record.jumlah_siswa,
                jumlah_kelulusan: record.jumlah_kelulusan,
                extra,
            }
        })
        .collect()
}

/// Stable sort on the displayed two-decimal score, highest first.
fn rank(enriched: Vec<EnrichedSekolah>, cap: usize) -> Vec<EnrichedSekolah> {
    let mut keyed: Vec<(f64, EnrichedSekolah)> = enriched
        .into_iter()
        .map(|s| (s.kecocokan.parse::<f64>().unwrap_or(0.0), s))
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    keyed.truncate(cap);
    keyed.into_iter().map(|(_, s)| s).collect()
}

/// Two-decimal percentage for display. Rounding is half away from zero and
/// works on the decimal digits the server sent (`"1.005"` → `"1.01"`,
/// `"60.125"` → `"60.13"`), so no binary float error creeps in. Unreadable
/// scores display as `"0.00"`.
pub fn format_score(raw: &Value) -> String {
    score_decimal(raw)
        .map(|decimal| round_half_up(&decimal))
        .unwrap_or_else(|| "0.00".to_string())
}

/// Normalises a score to a plain decimal (`-?digits[.digits]`). Accepts
/// numbers, numeric strings, a trailing `%` and decimal commas.
fn score_decimal(raw: &Value) -> Option<String> {
    match raw {
        // f64 Display is the shortest round-trip form and never uses an exponent
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| v.to_string()),
        Value::String(s) => {
            let s = s.trim().trim_end_matches('%').trim().replace(',', ".");
            if is_plain_decimal(&s) {
                Some(s.trim_start_matches('+').to_string())
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.to_string())
            }
        }
        _ => None,
    }
}

fn is_plain_decimal(s: &str) -> bool {
    let body = s.strip_prefix(|c| c == '-' || c == '+').unwrap_or(s);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    (!int.is_empty() || !frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Rounds a plain decimal to two places by its third fractional digit.
fn round_half_up(decimal: &str) -> String {
    let (negative, body) = match decimal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, decimal),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    let mut frac: Vec<u8> = frac_part.bytes().map(|b| b - b'0').collect();
    if frac.len() < 3 {
        frac.resize(3, 0);
    }
    let round_up = frac[2] >= 5;

    let mut digits: Vec<u8> = int_part
        .bytes()
        .map(|b| b - b'0')
        .chain(frac[..2].iter().copied())
        .collect();
    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let to_text = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let split = digits.len() - 2;
    let int = to_text(&digits[..split]);
    let int = match int.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let sign = if negative && digits.iter().any(|d| *d != 0) {
        "-"
    } else {
        ""
    };
    format!("{sign}{int}.{}", to_text(&digits[split..]))
}

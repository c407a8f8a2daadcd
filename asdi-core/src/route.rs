//! Resolve flight-plan route descriptions into fix sequences.
//!
//! A route description is a `.`/`*` separated list of elements:
//! fixes (`MERIT`, `KJFK`, `4230N/07530W`, `SAX090030`), airways (`J584`),
//! departure/arrival procedures (`HAPIE4`), and annotations that carry no
//! position (`/`, `SAX123`, `ABCTRANS`, `XXX`).
//!
//! Resolution is a single left-to-right pass with one element of lookahead.
//! Elements that cannot be resolved are dropped and reported as `Skipped`;
//! the only hard failure is a broken airway traversal, which means a bug in
//! this module rather than bad input.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::nav::{Airway, DistanceCalculator, Fix, NavigationLookup, Route};

/// Letter prepended to three-letter identifiers when looking up airports.
pub const DEFAULT_AIRPORT_PREFIX: &str = "K";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Why a route element contributed nothing to the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// `/` alone.
    TailoringMarker,
    /// Navaid with frequency or radial annotation (`SAX123`, `SAX123R`).
    NavaidFrequency,
    /// Transition name suffix (`...TRANS`).
    TransitionSuffix,
    /// `XXX`.
    UnknownFixMarker,
    /// SID/STAR id that did not resolve, or lacked context.
    ProcedureUnresolved,
    /// Airway with no usable exit fix.
    AirwayWithoutExit,
    /// Airway whose exit fix is not on it.
    OffFixNotOnAirway,
    /// Airway whose nearest entry equals its exit.
    AirwayAbandoned,
    /// Anything else.
    Unresolved,
}

/// One dropped route element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub index: usize,
    pub element: String,
    pub reason: SkipReason,
}

/// A resolved route plus the elements that were dropped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub route: Route,
    pub skipped: Vec<Skipped>,
}

impl Resolution {
    fn skip(&mut self, index: usize, element: &str, reason: SkipReason) {
        debug!(index, element, ?reason, "skipped route element");
        self.skipped.push(Skipped {
            index,
            element: element.to_string(),
            reason,
        });
    }
}

/// Internal failure during airway traversal.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    #[error(
        "airway {airway}: off-fix {off_fix} not at index {off_index} \
         (on-fix {on_fix} at {on_index}); airway [{fixes}]; route so far [{partial}]",
        fixes = .airway_fixes.join(" "),
        partial = .partial_route.join(" ")
    )]
    TraversalInvariant {
        airway: String,
        airway_fixes: Vec<String>,
        on_fix: String,
        on_index: usize,
        off_fix: String,
        off_index: usize,
        partial_route: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Element classification
// ---------------------------------------------------------------------------

/// Split a route description into its non-empty elements.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c == '.' || c == '*')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// SID/STAR id shape: at least 3 chars, ends in a digit, no other digits.
pub fn is_procedure_id(element: &str) -> bool {
    let b = element.as_bytes();
    b.len() >= 3
        && b[b.len() - 1].is_ascii_digit()
        && !b[..b.len() - 1].iter().any(u8::is_ascii_digit)
}

/// `AAAddd` or `AAAdddR`.
pub fn is_navaid_frequency(element: &str) -> bool {
    let b = element.as_bytes();
    let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);
    match b.len() {
        6 => digits(&b[3..]),
        7 => digits(&b[3..6]) && b[6] == b'R',
        _ => false,
    }
}

pub fn is_transition_suffix(element: &str) -> bool {
    ["TRANS", "TRAN", "TRNS"]
        .iter()
        .any(|s| element.len() > s.len() && element.ends_with(s))
}

fn classify_unresolved(element: &str) -> SkipReason {
    if is_navaid_frequency(element) {
        SkipReason::NavaidFrequency
    } else if is_transition_suffix(element) {
        SkipReason::TransitionSuffix
    } else if element == "XXX" {
        SkipReason::UnknownFixMarker
    } else {
        SkipReason::Unresolved
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Route resolver over a navigation database and distance calculator.
pub struct RouteParser<'a> {
    nav: &'a dyn NavigationLookup,
    calc: &'a dyn DistanceCalculator,
    airport_prefix: String,
}

impl<'a> RouteParser<'a> {
    pub fn new(nav: &'a dyn NavigationLookup, calc: &'a dyn DistanceCalculator) -> Self {
        RouteParser {
            nav,
            calc,
            airport_prefix: DEFAULT_AIRPORT_PREFIX.to_string(),
        }
    }

    pub fn with_airport_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.airport_prefix = prefix.into();
        self
    }

    /// Resolve a route description.
    pub fn resolve(&self, text: &str) -> Result<Resolution, RouteError> {
        let elements = tokenize(text);
        let mut out = Resolution::default();
        let mut i = 0;

        while i < elements.len() {
            let element = elements[i];

            if element == "/" {
                out.skip(i, element, SkipReason::TailoringMarker);
                i += 1;
                continue;
            }

            if let Some(fix) = self.resolve_fix(element, self.is_boundary(&elements, i)) {
                trace!(element, fix = fix.name(), "fix");
                out.route.push(fix);
            } else if let Some(airway) = self.nav.find_airway(element) {
                if self.expand_airway(airway, &elements, i, &mut out)? {
                    i += 1;
                }
            } else if is_procedure_id(element) {
                if self.expand_procedure(&elements, i, &mut out) {
                    i += 1;
                }
            } else {
                out.skip(i, element, classify_unresolved(element));
            }
            i += 1;
        }

        Ok(out)
    }

    fn is_boundary(&self, elements: &[&str], index: usize) -> bool {
        index == 0 || index + 1 == elements.len()
    }

    /// Resolve one element as a fix.
    ///
    /// A `/` suffix is tried first as part of a lat/lon pair, then dropped as
    /// a time annotation. At the ends of the route airports are preferred
    /// over same-named fixes; in the middle, fixes win.
    pub fn resolve_fix(&self, element: &str, boundary: bool) -> Option<Fix> {
        match element.split_once('/') {
            Some((name, _)) => self
                .nav
                .find_lat_lon_fix(element)
                .or_else(|| self.resolve_named(name, boundary)),
            None => self.resolve_named(element, boundary),
        }
    }

    fn resolve_named(&self, name: &str, boundary: bool) -> Option<Fix> {
        if name.is_empty() {
            return None;
        }
        let airport = || {
            self.nav
                .find_named_fix(&format!("{}{}", self.airport_prefix, name))
        };
        let named = || self.nav.find_named_fix(name);

        let found = if boundary {
            airport().or_else(named)
        } else {
            named().or_else(airport)
        };
        found.or_else(|| self.nav.find_radial_distance_fix(name))
    }

    /// Nearest candidate to `target`; the first of equal minima wins.
    fn closest<'f>(&self, candidates: &'f [Fix], target: &Fix) -> Option<(usize, &'f Fix)> {
        let mut best: Option<(usize, &Fix, f64)> = None;
        for (i, fix) in candidates.iter().enumerate() {
            let d = self.calc.distance(fix, target);
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, fix, d));
            }
        }
        best.map(|(i, fix, _)| (i, fix))
    }

    /// Where `current` hands over to `next`: their first shared fix, or the
    /// point on `current` closest to any point on `next`.
    fn junction(&self, current: &Airway, next: &Airway) -> Option<Fix> {
        if let Some(shared) = current.fixes().iter().find(|f| next.contains(f)) {
            return Some(shared.clone());
        }
        let mut best: Option<(&Fix, f64)> = None;
        for a in current.fixes() {
            for b in next.fixes() {
                let d = self.calc.distance(a, b);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((a, d));
                }
            }
        }
        best.map(|(fix, _)| fix.clone())
    }

    /// Append the airway segment. Returns true when the next element was
    /// used as the exit fix and must not be processed again, including when
    /// the airway is abandoned.
    fn expand_airway(
        &self,
        airway: &Airway,
        elements: &[&str],
        index: usize,
        out: &mut Resolution,
    ) -> Result<bool, RouteError> {
        let element = elements[index];
        let next_index = index + 1;

        let (off_fix, from_next) = match elements.get(next_index) {
            Some(next) => match self.resolve_fix(next, self.is_boundary(elements, next_index)) {
                Some(fix) => (Some(fix), true),
                None => match self.nav.find_airway(next) {
                    Some(next_airway) => (self.junction(airway, next_airway), false),
                    None => (None, false),
                },
            },
            None => (None, false),
        };

        let Some(off_fix) = off_fix else {
            out.skip(index, element, SkipReason::AirwayWithoutExit);
            return Ok(false);
        };
        let Some(off_index) = airway.position(&off_fix) else {
            out.skip(index, element, SkipReason::OffFixNotOnAirway);
            return Ok(false);
        };

        let (on_index, entry) = match out.route.last() {
            Some(prev) => match airway.position(prev) {
                Some(i) => (i, None),
                None => match self.closest(airway.fixes(), prev) {
                    Some((i, fix)) => (i, Some(fix)),
                    None => {
                        out.skip(index, element, SkipReason::AirwayWithoutExit);
                        return Ok(false);
                    }
                },
            },
            None => match airway.fixes().first() {
                Some(first) => (0, Some(first)),
                None => {
                    out.skip(index, element, SkipReason::AirwayWithoutExit);
                    return Ok(false);
                }
            },
        };

        if entry == Some(&off_fix) && !out.route.is_empty() {
            out.skip(index, element, SkipReason::AirwayAbandoned);
            return Ok(from_next);
        }

        let between = segment(airway, on_index, off_index, &off_fix, &out.route)?;
        trace!(
            airway = airway.id(),
            on_index,
            off_index,
            count = between.len(),
            "airway segment"
        );

        if let Some(entry) = entry {
            out.route.push(entry.clone());
        }
        out.route.extend(between);
        if out.route.last() != Some(&off_fix) {
            out.route.push(off_fix);
        }
        Ok(from_next)
    }

    /// Append a SID or STAR. Returns true when the next element was used as
    /// the SID's ending fix.
    fn expand_procedure(&self, elements: &[&str], index: usize, out: &mut Resolution) -> bool {
        let element = elements[index];

        if let Some(sid) = self.nav.find_sid(element) {
            let next_index = index + 1;
            let fixes = elements
                .get(next_index)
                .and_then(|next| self.resolve_fix(next, self.is_boundary(elements, next_index)))
                .and_then(|end| sid.route_ending_at(&end));
            let Some(fixes) = fixes else {
                out.skip(index, element, SkipReason::ProcedureUnresolved);
                return false;
            };
            // The first fix is the departure point already on the route.
            let start = usize::from(!out.route.is_empty());
            out.route.extend(&fixes[start.min(fixes.len())..]);
            return true;
        }

        if let Some(star) = self.nav.find_star(element) {
            let fixes = out
                .route
                .last()
                .and_then(|from| star.route_starting_at(from));
            match fixes {
                Some(fixes) => out.route.extend(fixes),
                None => out.skip(index, element, SkipReason::ProcedureUnresolved),
            }
            return false;
        }

        out.skip(index, element, SkipReason::ProcedureUnresolved);
        false
    }
}

/// Airway fixes strictly between `on_index` and `off_index`, in travel
/// order. `off_fix` must sit at `off_index`.
pub fn segment<'w>(
    airway: &'w Airway,
    on_index: usize,
    off_index: usize,
    off_fix: &Fix,
    route: &Route,
) -> Result<Vec<&'w Fix>, RouteError> {
    let fixes = airway.fixes();
    if fixes.get(off_index) != Some(off_fix) || on_index >= fixes.len() {
        let err = RouteError::TraversalInvariant {
            airway: airway.id().to_string(),
            airway_fixes: fixes.iter().map(|f| f.name().to_string()).collect(),
            on_fix: fixes
                .get(on_index)
                .map(|f| f.name().to_string())
                .unwrap_or_default(),
            on_index,
            off_fix: off_fix.name().to_string(),
            off_index,
            partial_route: route.names().iter().map(|n| n.to_string()).collect(),
        };
        error!(%err, "airway traversal invariant violated");
        return Err(err);
    }

    let between: Vec<&Fix> = if on_index <= off_index {
        fixes
            .get(on_index + 1..off_index)
            .unwrap_or(&[])
            .iter()
            .collect()
    } else {
        fixes
            .get(off_index + 1..on_index)
            .unwrap_or(&[])
            .iter()
            .rev()
            .collect()
    };
    Ok(between)
}

/// Resolve `text` with the default airport prefix.
pub fn resolve(
    text: &str,
    nav: &dyn NavigationLookup,
    calc: &dyn DistanceCalculator,
) -> Result<Resolution, RouteError> {
    RouteParser::new(nav, calc).resolve(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GreatCircle;
    use crate::nav::{NavDatabase, Sid, Star};

    fn test_db() -> NavDatabase {
        let mut db = NavDatabase::new();
        let fixes = [
            ("F1", 40.0, -75.0),
            ("F2", 40.0, -74.0),
            ("F3", 40.0, -73.0),
            ("F4", 40.0, -72.0),
            ("H1", 42.0, -73.0),
            ("H2", 41.0, -73.0),
            ("H3", 39.0, -73.0),
            ("K1", 40.3, -72.0),
            ("K2", 41.0, -71.0),
            ("KDEP", 38.0, -77.0),
            ("SB", 38.5, -76.5),
            ("SC", 39.0, -76.0),
            ("SD", 39.5, -75.5),
            ("SE", 39.8, -75.2),
            ("SM", 42.0, -70.0),
            ("SN", 42.2, -69.5),
            ("SP", 42.4, -69.0),
            ("SQ", 42.6, -68.5),
            ("KARR", 42.8, -68.0),
            ("ABC", 37.0, -80.0),
            ("KABC", 37.5, -80.5),
        ];
        for (name, lat, lon) in fixes {
            db.add_fix(Fix::new(name, lat, lon));
        }
        let get = |db: &NavDatabase, names: &[&str]| -> Vec<Fix> {
            names
                .iter()
                .map(|n| db.find_named_fix(n).unwrap())
                .collect()
        };
        let j1 = get(&db, &["F1", "F2", "F3", "F4"]);
        let j2 = get(&db, &["H1", "H2", "F3", "H3"]);
        let j3 = get(&db, &["K1", "K2"]);
        db.add_airway(Airway::new("J1", j1));
        db.add_airway(Airway::new("J2", j2));
        db.add_airway(Airway::new("J3", j3));

        let sid_basic = get(&db, &["KDEP", "SB", "SC"]);
        let sid_trans = get(&db, &["SC", "SD", "SE"]);
        db.add_sid(Sid::new("DEPRT1", sid_basic, vec![sid_trans]));

        let star_basic = get(&db, &["SP", "SQ", "KARR"]);
        let star_trans = get(&db, &["SM", "SN", "SP"]);
        db.add_star(Star::new("ARRVL2", star_basic, vec![star_trans]));
        db
    }

    fn run(db: &NavDatabase, text: &str) -> Resolution {
        resolve(text, db, &GreatCircle).unwrap()
    }

    fn names(res: &Resolution) -> Vec<&str> {
        res.route.names()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("KBOS.MERIT..J584*SLT. .KORD"),
            ["KBOS", "MERIT", "J584", "SLT", "KORD"]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_classifiers() {
        assert!(is_procedure_id("DEPRT1"));
        assert!(is_procedure_id("ABC4"));
        assert!(!is_procedure_id("J80"));
        assert!(!is_procedure_id("V1"));
        assert!(!is_procedure_id("Q12"));
        assert!(!is_procedure_id("MERIT"));

        assert!(is_navaid_frequency("SAX123"));
        assert!(is_navaid_frequency("SAX123R"));
        assert!(!is_navaid_frequency("SAX12R"));
        assert!(!is_navaid_frequency("MERIT"));

        assert!(is_transition_suffix("ABCTRANS"));
        assert!(is_transition_suffix("ABCTRNS"));
        assert!(!is_transition_suffix("TRANS"));
    }

    #[test]
    fn test_airway_forward() {
        let db = test_db();
        assert_eq!(names(&run(&db, "F1.J1.F4")), ["F1", "F2", "F3", "F4"]);
    }

    #[test]
    fn test_airway_backward() {
        let db = test_db();
        assert_eq!(names(&run(&db, "F4.J1.F1")), ["F4", "F3", "F2", "F1"]);
    }

    #[test]
    fn test_airway_adjacent_fixes() {
        let db = test_db();
        assert_eq!(names(&run(&db, "F2.J1.F3")), ["F2", "F3"]);
    }

    #[test]
    fn test_airway_first_element_starts_at_airway_head() {
        let db = test_db();
        assert_eq!(names(&run(&db, "J1.F3")), ["F1", "F2", "F3"]);
    }

    #[test]
    fn test_airway_to_airway_shared_fix() {
        let db = test_db();
        let res = run(&db, "F1.J1.J2.H1");
        assert_eq!(names(&res), ["F1", "F2", "F3", "H2", "H1"]);
        assert!(res.skipped.is_empty());
    }

    #[test]
    fn test_airway_to_airway_closest_pair() {
        let db = test_db();
        let res = run(&db, "F1.J1.J3.K2");
        assert_eq!(names(&res), ["F1", "F2", "F3", "F4", "K1", "K2"]);
    }

    #[test]
    fn test_airway_entry_substitution_abandons_zero_length_segment() {
        let db = test_db();
        let res = run(&db, "F4.J3.K1");
        assert_eq!(names(&res), ["F4"]);
        assert_eq!(res.skipped.len(), 1);
        assert_eq!(res.skipped[0].element, "J3");
        assert_eq!(res.skipped[0].reason, SkipReason::AirwayAbandoned);
    }

    #[test]
    fn test_airway_entry_substitution() {
        let db = test_db();
        // F4 is off J3; K1 is the nearest entry.
        assert_eq!(names(&run(&db, "F4.J3.K2")), ["F4", "K1", "K2"]);
    }

    #[test]
    fn test_abandoned_airway_resumes_after_exit() {
        let db = test_db();
        let res = run(&db, "F4.J3.K1.K2");
        assert_eq!(names(&res), ["F4", "K2"]);
        assert_eq!(res.skipped[0].reason, SkipReason::AirwayAbandoned);
    }

    /// Straight-line distance in degrees, so ties are exact.
    struct Planar;

    impl DistanceCalculator for Planar {
        fn distance(&self, a: &Fix, b: &Fix) -> f64 {
            ((a.lat() - b.lat()).powi(2) + (a.lon() - b.lon()).powi(2)).sqrt()
        }
    }

    fn planar_db(fixes: &[(&str, f64, f64)], airways: &[(&str, &[&str])]) -> NavDatabase {
        let mut db = NavDatabase::new();
        for &(name, lat, lon) in fixes {
            db.add_fix(Fix::new(name, lat, lon));
        }
        for &(id, names) in airways {
            let fixes = names
                .iter()
                .map(|n| db.find_named_fix(n).unwrap())
                .collect();
            db.add_airway(Airway::new(id, fixes));
        }
        db
    }

    #[test]
    fn test_entry_tie_prefers_first_airway_fix() {
        // PA is exactly 1 from both WA and WB.
        let db = planar_db(
            &[
                ("PA", 0.0, 0.0),
                ("WA", 0.0, 1.0),
                ("WB", 0.0, -1.0),
                ("WC", 5.0, 0.0),
            ],
            &[("W1", &["WA", "WB", "WC"][..])],
        );
        let res = RouteParser::new(&db, &Planar).resolve("PA.W1.WC").unwrap();
        assert_eq!(names(&res), ["PA", "WA", "WB", "WC"]);
    }

    #[test]
    fn test_junction_tie_prefers_first_point_on_current_airway() {
        // XA and XB are both sqrt(2) from YA.
        let db = planar_db(
            &[
                ("XA", 0.0, 0.0),
                ("XB", 0.0, 2.0),
                ("YA", 1.0, 1.0),
                ("YB", 5.0, 5.0),
            ],
            &[("W2", &["XA", "XB"][..]), ("W3", &["YA", "YB"][..])],
        );
        let res = RouteParser::new(&db, &Planar)
            .resolve("XB.W2.W3.YB")
            .unwrap();
        assert_eq!(names(&res), ["XB", "XA", "YA", "YB"]);
        assert!(res.skipped.is_empty());
    }

    #[test]
    fn test_airway_exit_not_on_airway() {
        let db = test_db();
        let res = run(&db, "F1.J1.H1");
        assert_eq!(names(&res), ["F1", "H1"]);
        assert_eq!(res.skipped[0].reason, SkipReason::OffFixNotOnAirway);
    }

    #[test]
    fn test_airway_without_exit() {
        let db = test_db();
        let res = run(&db, "F1.J1");
        assert_eq!(names(&res), ["F1"]);
        assert_eq!(res.skipped[0].reason, SkipReason::AirwayWithoutExit);
    }

    #[test]
    fn test_sid_with_transition() {
        let db = test_db();
        let res = run(&db, "DEP.DEPRT1.SE");
        assert_eq!(names(&res), ["KDEP", "SB", "SC", "SD", "SE"]);
    }

    #[test]
    fn test_sid_basic_route_only() {
        let db = test_db();
        let res = run(&db, "DEP.DEPRT1.SC");
        assert_eq!(names(&res), ["KDEP", "SB", "SC"]);
    }

    #[test]
    fn test_sid_then_airway() {
        let db = test_db();
        let res = run(&db, "DEP.DEPRT1.SE.F1.J1.F3");
        assert_eq!(
            names(&res),
            ["KDEP", "SB", "SC", "SD", "SE", "F1", "F2", "F3"]
        );
    }

    #[test]
    fn test_sid_unknown_ending_fix() {
        let db = test_db();
        let res = run(&db, "DEP.DEPRT1.F1");
        assert_eq!(names(&res), ["KDEP", "F1"]);
        assert_eq!(res.skipped[0].reason, SkipReason::ProcedureUnresolved);
    }

    #[test]
    fn test_star_from_transition() {
        let db = test_db();
        let res = run(&db, "SM.ARRVL2");
        assert_eq!(names(&res), ["SM", "SM", "SN", "SP", "SQ", "KARR"]);
    }

    #[test]
    fn test_star_needs_preceding_fix() {
        let db = test_db();
        let res = run(&db, "ARRVL2.ARR");
        assert_eq!(names(&res), ["KARR"]);
        assert_eq!(res.skipped[0].reason, SkipReason::ProcedureUnresolved);
    }

    #[test]
    fn test_unknown_procedure() {
        let db = test_db();
        let res = run(&db, "F1.NOPROC3.F2");
        assert_eq!(names(&res), ["F1", "F2"]);
        assert_eq!(res.skipped[0].reason, SkipReason::ProcedureUnresolved);
    }

    #[test]
    fn test_annotations_are_skipped() {
        let db = test_db();
        let res = run(&db, "F1./.SAX123.SAX123R.ABCTRANS.XXX.ZZZZZ.F2");
        assert_eq!(names(&res), ["F1", "F2"]);
        let reasons: Vec<SkipReason> = res.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            [
                SkipReason::TailoringMarker,
                SkipReason::NavaidFrequency,
                SkipReason::NavaidFrequency,
                SkipReason::TransitionSuffix,
                SkipReason::UnknownFixMarker,
                SkipReason::Unresolved,
            ]
        );
        assert_eq!(res.skipped[5].index, 6);
    }

    #[test]
    fn test_time_annotation_is_stripped() {
        let db = test_db();
        assert_eq!(names(&run(&db, "F1/0130.J1.F3/0200")), ["F1", "F2", "F3"]);
    }

    #[test]
    fn test_lat_lon_element() {
        let db = test_db();
        let res = run(&db, "F1.4230N/07530W.F2");
        assert_eq!(names(&res), ["F1", "4230N/07530W", "F2"]);
        let fix = &res.route.fixes()[1];
        assert!((fix.lat() - 42.5).abs() < 1e-9);
        assert!((fix.lon() + 75.5).abs() < 1e-9);
    }

    #[test]
    fn test_radial_distance_element() {
        let db = test_db();
        let res = run(&db, "F1.F1090060.F4");
        assert_eq!(names(&res), ["F1", "F1090060", "F4"]);
        let fix = &res.route.fixes()[1];
        assert!(fix.lon() > -75.0 && fix.lon() < -73.5);
    }

    #[test]
    fn test_airport_preferred_at_route_ends() {
        let db = test_db();
        assert_eq!(names(&run(&db, "ABC.ABC.ABC")), ["KABC", "ABC", "KABC"]);
    }

    #[test]
    fn test_custom_airport_prefix() {
        let mut db = test_db();
        db.add_fix(Fix::new("PABC", 61.0, -150.0));
        let res = RouteParser::new(&db, &GreatCircle)
            .with_airport_prefix("P")
            .resolve("ABC.F1")
            .unwrap();
        assert_eq!(names(&res), ["PABC", "F1"]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let db = test_db();
        let text = "DEP.DEPRT1.SE.F1.J1.J2.H1..SM.ARRVL2.ARR";
        let a = run(&db, text);
        let b = run(&db, text);
        assert_eq!(a.route.fixes(), b.route.fixes());
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_unknown_element_does_not_change_route() {
        let db = test_db();
        let base = run(&db, "DEP.F1.J1.F4.J3.K2");
        let noisy = run(&db, "DEP.QQQQQ.F1.J1.F4.J3.K2");
        assert_eq!(names(&base), names(&noisy));
        assert_eq!(noisy.skipped.len(), base.skipped.len() + 1);
    }

    #[test]
    fn test_empty_description() {
        let db = test_db();
        let res = run(&db, "");
        assert!(res.route.is_empty());
        assert!(res.skipped.is_empty());
    }

    #[test]
    fn test_segment_directions() {
        let db = test_db();
        let j1 = db.find_airway("J1").unwrap();
        let f1 = db.find_named_fix("F1").unwrap();
        let f4 = db.find_named_fix("F4").unwrap();
        let route = Route::new();

        let fwd: Vec<&str> = segment(j1, 0, 3, &f4, &route)
            .unwrap()
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(fwd, ["F2", "F3"]);

        let back: Vec<&str> = segment(j1, 3, 0, &f1, &route)
            .unwrap()
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(back, ["F3", "F2"]);

        assert!(segment(j1, 2, 2, &db.find_named_fix("F3").unwrap(), &route)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_segment_invariant_violation() {
        let db = test_db();
        let j1 = db.find_airway("J1").unwrap();
        let mut route = Route::new();
        route.push(db.find_named_fix("F1").unwrap());
        let h1 = db.find_named_fix("H1").unwrap();

        let err = segment(j1, 0, 2, &h1, &route).unwrap_err();
        let RouteError::TraversalInvariant {
            airway,
            airway_fixes,
            off_index,
            partial_route,
            ..
        } = &err;
        assert_eq!(airway, "J1");
        assert_eq!(airway_fixes.len(), 4);
        assert_eq!(*off_index, 2);
        assert_eq!(partial_route, &["F1".to_string()]);
        assert!(err.to_string().contains("F1 F2 F3 F4"));
    }
}

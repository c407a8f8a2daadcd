//! Navigation network model and the lookup contracts the route parser uses.
//!
//! `Fix`, `Airway`, `Sid` and `Star` are owned by whatever implements
//! `NavigationLookup`; the parser only reads and compares them. Equality is
//! by identity (name or id), never by coordinates.
//!
//! `NavDatabase` is an in-memory `NavigationLookup` loaded from JSON.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::fields;
use crate::geo;
use crate::types::{AsdiError, Result};

// ---------------------------------------------------------------------------
// Fix
// ---------------------------------------------------------------------------

/// A named or ad-hoc geographic point. Latitude/longitude in signed degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    name: String,
    lat: f64,
    lon: f64,
}

impl Fix {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Fix {
            name: name.into(),
            lat,
            lon,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl PartialEq for Fix {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Fix {}

impl Hash for Fix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.name, self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Ordered fix sequence. Adjacent duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    fixes: Vec<Fix>,
}

impl Route {
    pub fn new() -> Self {
        Route::default()
    }

    pub fn push(&mut self, fix: Fix) {
        self.fixes.push(fix);
    }

    pub fn extend<'a>(&mut self, fixes: impl IntoIterator<Item = &'a Fix>) {
        self.fixes.extend(fixes.into_iter().cloned());
    }

    pub fn last(&self) -> Option<&Fix> {
        self.fixes.last()
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    /// Fix names in order.
    pub fn names(&self) -> Vec<&str> {
        self.fixes.iter().map(Fix::name).collect()
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.names().join(" "))
    }
}

// ---------------------------------------------------------------------------
// Airway
// ---------------------------------------------------------------------------

/// A named, ordered chain of fixes.
#[derive(Debug, Clone, Serialize)]
pub struct Airway {
    id: String,
    fixes: Vec<Fix>,
}

impl Airway {
    pub fn new(id: impl Into<String>, fixes: Vec<Fix>) -> Self {
        Airway {
            id: id.into(),
            fixes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    pub fn position(&self, fix: &Fix) -> Option<usize> {
        self.fixes.iter().position(|f| f == fix)
    }

    pub fn contains(&self, fix: &Fix) -> bool {
        self.position(fix).is_some()
    }
}

impl PartialEq for Airway {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Airway {}

// ---------------------------------------------------------------------------
// SID / STAR
// ---------------------------------------------------------------------------

/// Join `head` and `tail`, dropping the first fix of `tail` when it repeats
/// the last fix of `head`.
fn join(head: &[Fix], tail: &[Fix]) -> Vec<Fix> {
    let mut out = head.to_vec();
    match (head.last(), tail.first()) {
        (Some(h), Some(t)) if h == t => out.extend_from_slice(&tail[1..]),
        _ => out.extend_from_slice(tail),
    }
    out
}

/// Standard instrument departure.
///
/// The basic route ends at the transition fix; every transition starts
/// there. Procedure routes are indexed by their final fix.
#[derive(Debug, Clone)]
pub struct Sid {
    id: String,
    basic: Vec<Fix>,
    routes: HashMap<String, Vec<Fix>>,
}

impl Sid {
    pub fn new(id: impl Into<String>, basic: Vec<Fix>, transitions: Vec<Vec<Fix>>) -> Self {
        let mut routes = HashMap::new();
        if let Some(end) = basic.last() {
            routes.insert(end.name().to_string(), basic.clone());
        }
        for t in &transitions {
            if let Some(end) = t.last() {
                routes.insert(end.name().to_string(), join(&basic, t));
            }
        }
        Sid {
            id: id.into(),
            basic,
            routes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn basic_route(&self) -> &[Fix] {
        &self.basic
    }

    pub fn transition_fix(&self) -> Option<&Fix> {
        self.basic.last()
    }

    /// Full procedure route ending at `fix`.
    pub fn route_ending_at(&self, fix: &Fix) -> Option<&[Fix]> {
        self.routes.get(fix.name()).map(Vec::as_slice)
    }
}

impl PartialEq for Sid {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Standard terminal arrival route.
///
/// The basic route starts at the entry fix; every transition ends there.
/// Procedure routes are indexed by their first fix.
#[derive(Debug, Clone)]
pub struct Star {
    id: String,
    basic: Vec<Fix>,
    routes: HashMap<String, Vec<Fix>>,
}

impl Star {
    pub fn new(id: impl Into<String>, basic: Vec<Fix>, transitions: Vec<Vec<Fix>>) -> Self {
        let mut routes = HashMap::new();
        if let Some(start) = basic.first() {
            routes.insert(start.name().to_string(), basic.clone());
        }
        for t in &transitions {
            if let Some(start) = t.first() {
                routes.insert(start.name().to_string(), join(t, &basic));
            }
        }
        Star {
            id: id.into(),
            basic,
            routes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn basic_route(&self) -> &[Fix] {
        &self.basic
    }

    pub fn entry_fix(&self) -> Option<&Fix> {
        self.basic.first()
    }

    /// Full procedure route starting at `fix`.
    pub fn route_starting_at(&self, fix: &Fix) -> Option<&[Fix]> {
        self.routes.get(fix.name()).map(Vec::as_slice)
    }
}

impl PartialEq for Star {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// ---------------------------------------------------------------------------
// Lookup contracts
// ---------------------------------------------------------------------------

/// Read-only access to the navigation network.
pub trait NavigationLookup {
    fn find_airway(&self, id: &str) -> Option<&Airway>;
    fn find_sid(&self, id: &str) -> Option<&Sid>;
    fn find_star(&self, id: &str) -> Option<&Star>;
    fn find_named_fix(&self, name: &str) -> Option<Fix>;
    /// Resolve a bearing/range definition such as `SAX090030`.
    fn find_radial_distance_fix(&self, description: &str) -> Option<Fix>;
    /// Resolve a coordinate definition such as `4230N/07530W`.
    fn find_lat_lon_fix(&self, description: &str) -> Option<Fix>;
}

/// Distance between two fixes. Units must be consistent across calls.
pub trait DistanceCalculator {
    fn distance(&self, a: &Fix, b: &Fix) -> f64;
}

// ---------------------------------------------------------------------------
// In-memory database
// ---------------------------------------------------------------------------

/// On-disk shape: procedures and airways reference fixes by name.
#[derive(Debug, Default, Deserialize)]
struct NavFile {
    #[serde(default)]
    fixes: Vec<Fix>,
    #[serde(default)]
    airways: Vec<AirwayRecord>,
    #[serde(default)]
    sids: Vec<ProcedureRecord>,
    #[serde(default)]
    stars: Vec<ProcedureRecord>,
}

#[derive(Debug, Deserialize)]
struct AirwayRecord {
    id: String,
    fixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProcedureRecord {
    id: String,
    basic: Vec<String>,
    #[serde(default)]
    transitions: Vec<Vec<String>>,
}

/// HashMap-backed navigation database.
#[derive(Debug, Clone, Default)]
pub struct NavDatabase {
    fixes: HashMap<String, Fix>,
    airways: HashMap<String, Airway>,
    sids: HashMap<String, Sid>,
    stars: HashMap<String, Star>,
}

impl NavDatabase {
    pub fn new() -> Self {
        NavDatabase::default()
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        NavDatabase::from_json(&text)
    }

    /// Parse JSON navigation data.
    ///
    /// ```json
    /// { "fixes":    [{"name": "MERIT", "lat": 41.38, "lon": -73.14}],
    ///   "airways":  [{"id": "J584", "fixes": ["MERIT", "SLT"]}],
    ///   "sids":     [{"id": "HAPIE4", "basic": ["KJFK", "HAPIE"], "transitions": [["HAPIE", "BETTE"]]}],
    ///   "stars":    [{"id": "ROBUC3", "basic": ["ROBUC", "KATL"], "transitions": []}] }
    /// ```
    pub fn from_json(text: &str) -> Result<Self> {
        let file: NavFile = serde_json::from_str(text)?;
        let mut db = NavDatabase::new();
        for fix in file.fixes {
            db.add_fix(fix);
        }
        for rec in file.airways {
            let fixes = db.lookup_all(&rec.id, &rec.fixes)?;
            db.add_airway(Airway::new(rec.id, fixes));
        }
        for rec in file.sids {
            let (basic, transitions) = db.lookup_procedure(&rec)?;
            db.add_sid(Sid::new(rec.id, basic, transitions));
        }
        for rec in file.stars {
            let (basic, transitions) = db.lookup_procedure(&rec)?;
            db.add_star(Star::new(rec.id, basic, transitions));
        }
        Ok(db)
    }

    fn lookup_all(&self, owner: &str, names: &[String]) -> Result<Vec<Fix>> {
        names
            .iter()
            .map(|n| {
                self.fixes
                    .get(n)
                    .cloned()
                    .ok_or_else(|| AsdiError::NavData(format!("{owner}: unknown fix {n}")))
            })
            .collect()
    }

    fn lookup_procedure(&self, rec: &ProcedureRecord) -> Result<(Vec<Fix>, Vec<Vec<Fix>>)> {
        let basic = self.lookup_all(&rec.id, &rec.basic)?;
        let transitions = rec
            .transitions
            .iter()
            .map(|t| self.lookup_all(&rec.id, t))
            .collect::<Result<Vec<_>>>()?;
        Ok((basic, transitions))
    }

    pub fn add_fix(&mut self, fix: Fix) {
        self.fixes.insert(fix.name().to_string(), fix);
    }

    pub fn add_airway(&mut self, airway: Airway) {
        self.airways.insert(airway.id().to_string(), airway);
    }

    pub fn add_sid(&mut self, sid: Sid) {
        self.sids.insert(sid.id().to_string(), sid);
    }

    pub fn add_star(&mut self, star: Star) {
        self.stars.insert(star.id().to_string(), star);
    }

    pub fn fix_count(&self) -> usize {
        self.fixes.len()
    }

    pub fn airway_count(&self) -> usize {
        self.airways.len()
    }
}

impl NavigationLookup for NavDatabase {
    fn find_airway(&self, id: &str) -> Option<&Airway> {
        self.airways.get(id)
    }

    fn find_sid(&self, id: &str) -> Option<&Sid> {
        self.sids.get(id)
    }

    fn find_star(&self, id: &str) -> Option<&Star> {
        self.stars.get(id)
    }

    fn find_named_fix(&self, name: &str) -> Option<Fix> {
        self.fixes.get(name).cloned()
    }

    /// `NAVAIDbbbddd`: navaid name, 3-digit true bearing, 3-digit range (NM).
    fn find_radial_distance_fix(&self, description: &str) -> Option<Fix> {
        if description.len() < 8 || !description.is_ascii() {
            return None;
        }
        let (navaid, digits) = description.split_at(description.len() - 6);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let origin = self.find_named_fix(navaid)?;
        let bearing: f64 = digits[..3].parse().ok()?;
        let range: f64 = digits[3..].parse().ok()?;
        if bearing > 360.0 {
            return None;
        }
        let (lat, lon) = geo::destination(origin.lat(), origin.lon(), bearing, range);
        Some(Fix::new(description, lat, lon))
    }

    /// `ddmmN/dddmmW` or `ddmmNdddmmW`.
    fn find_lat_lon_fix(&self, description: &str) -> Option<Fix> {
        let (lat, lon) = match description.len() {
            12 => fields::position(description)?,
            11 if description.is_ascii() => {
                let track = format!("{}/{}", &description[..5], &description[5..]);
                fields::position(&track)?
            }
            _ => return None,
        };
        Some(Fix::new(description, lat, lon))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(name: &str) -> Fix {
        Fix::new(name, 0.0, 0.0)
    }

    fn names(fixes: &[Fix]) -> Vec<&str> {
        fixes.iter().map(Fix::name).collect()
    }

    #[test]
    fn test_fix_equality_is_by_name() {
        assert_eq!(Fix::new("A", 1.0, 2.0), Fix::new("A", 3.0, 4.0));
        assert_ne!(Fix::new("A", 1.0, 2.0), Fix::new("B", 1.0, 2.0));
    }

    #[test]
    fn test_route_allows_duplicates() {
        let mut r = Route::new();
        r.push(fix("A"));
        r.push(fix("A"));
        assert_eq!(r.len(), 2);
        assert_eq!(r.to_string(), "A A");
    }

    #[test]
    fn test_airway_position() {
        let aw = Airway::new("J1", vec![fix("A"), fix("B"), fix("C")]);
        assert_eq!(aw.position(&fix("C")), Some(2));
        assert!(!aw.contains(&fix("D")));
        assert_eq!(aw, Airway::new("J1", vec![]));
    }

    #[test]
    fn test_sid_routes() {
        let sid = Sid::new(
            "DEPRT1",
            vec![fix("A"), fix("B"), fix("C")],
            vec![vec![fix("C"), fix("D"), fix("E")]],
        );
        assert_eq!(sid.transition_fix(), Some(&fix("C")));
        assert_eq!(
            names(sid.route_ending_at(&fix("E")).unwrap()),
            ["A", "B", "C", "D", "E"]
        );
        assert_eq!(names(sid.route_ending_at(&fix("C")).unwrap()), ["A", "B", "C"]);
        assert!(sid.route_ending_at(&fix("D")).is_none());
    }

    #[test]
    fn test_star_routes() {
        let star = Star::new(
            "ARRVL2",
            vec![fix("P"), fix("Q"), fix("KXYZ")],
            vec![vec![fix("M"), fix("N"), fix("P")]],
        );
        assert_eq!(star.entry_fix(), Some(&fix("P")));
        assert_eq!(
            names(star.route_starting_at(&fix("M")).unwrap()),
            ["M", "N", "P", "Q", "KXYZ"]
        );
        assert_eq!(
            names(star.route_starting_at(&fix("P")).unwrap()),
            ["P", "Q", "KXYZ"]
        );
        assert!(star.route_starting_at(&fix("Q")).is_none());
    }

    const NAV_JSON: &str = r#"{
        "fixes": [
            {"name": "KJFK", "lat": 40.6398, "lon": -73.7789},
            {"name": "MERIT", "lat": 41.3819, "lon": -73.1375},
            {"name": "SLT", "lat": 41.5128, "lon": -77.9700}
        ],
        "airways": [{"id": "J584", "fixes": ["MERIT", "SLT"]}],
        "sids": [{"id": "HAPIE4", "basic": ["KJFK", "MERIT"]}]
    }"#;

    #[test]
    fn test_from_json() {
        let db = NavDatabase::from_json(NAV_JSON).unwrap();
        assert_eq!(db.fix_count(), 3);
        assert_eq!(db.airway_count(), 1);
        assert_eq!(db.find_airway("J584").unwrap().fixes().len(), 2);
        assert!(db.find_sid("HAPIE4").is_some());
        assert!(db.find_star("HAPIE4").is_none());
        assert!(db.find_named_fix("MERIT").is_some());
    }

    #[test]
    fn test_from_json_unknown_fix() {
        let text = r#"{"airways": [{"id": "J1", "fixes": ["NOWHERE"]}]}"#;
        let err = NavDatabase::from_json(text).unwrap_err();
        assert!(matches!(err, AsdiError::NavData(ref m) if m.contains("NOWHERE")));
    }

    #[test]
    fn test_lat_lon_fix() {
        let db = NavDatabase::new();
        let f = db.find_lat_lon_fix("4230N/07530W").unwrap();
        assert_eq!(f.name(), "4230N/07530W");
        assert!((f.lat() - 42.5).abs() < 1e-9);
        assert!((f.lon() + 75.5).abs() < 1e-9);

        let f = db.find_lat_lon_fix("4230N07530W").unwrap();
        assert!((f.lon() + 75.5).abs() < 1e-9);

        assert!(db.find_lat_lon_fix("MERIT/0130").is_none());
    }

    #[test]
    fn test_radial_distance_fix() {
        let db = NavDatabase::from_json(NAV_JSON).unwrap();
        let f = db.find_radial_distance_fix("MERIT360030").unwrap();
        assert_eq!(f.name(), "MERIT360030");
        assert!((f.lat() - 41.8816).abs() < 0.01, "got {}", f.lat());
        assert!((f.lon() + 73.1375).abs() < 1e-6);

        assert!(db.find_radial_distance_fix("NOPE090010").is_none());
        assert!(db.find_radial_distance_fix("MERIT").is_none());
        assert!(db.find_radial_distance_fix("MERIT999010").is_none());
    }
}

#![allow(dead_code)]

use pokelab::api::{BoxError, HttpResponse, Transport};
use pokelab::{PokemonRow, PokemonTable, Stat};
use reqwest::Url;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

pub const BASE: &str = "http://pokeapi.test/api/v2";

/// One canned reply from [`Scripted`].
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Json(Value),
    Body(&'static str),
    Down,
}

/// In-memory transport: per-URL reply queues. The last reply of a queue repeats;
/// unknown URLs answer 404.
#[derive(Default)]
pub struct Scripted {
    routes: RefCell<HashMap<String, VecDeque<Reply>>>,
    pub calls: RefCell<Vec<String>>,
}

impl Scripted {
    pub fn route(self, url: &str, replies: Vec<Reply>) -> Self {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), replies.into_iter().collect());
        self
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == url).count()
    }
}

impl Transport for Scripted {
    fn get(&self, url: &Url) -> Result<HttpResponse, BoxError> {
        self.calls.borrow_mut().push(url.to_string());
        let mut routes = self.routes.borrow_mut();
        let reply = match routes.get_mut(url.as_str()) {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        }
        .unwrap_or(Reply::Status(404));
        match reply {
            Reply::Status(status) => Ok(HttpResponse {
                status,
                body: Vec::new(),
            }),
            Reply::Json(v) => Ok(HttpResponse {
                status: 200,
                body: serde_json::to_vec(&v)?,
            }),
            Reply::Body(b) => Ok(HttpResponse {
                status: 200,
                body: b.as_bytes().to_vec(),
            }),
            Reply::Down => Err("connection refused".into()),
        }
    }
}

/// Base stats whose sum is `total` (all in hp).
pub fn stats_with_total(total: u32) -> BTreeMap<Stat, u32> {
    Stat::ALL
        .iter()
        .map(|s| (*s, if *s == Stat::Hp { total } else { 0 }))
        .collect()
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

pub fn row(
    id: &str,
    types: &[&str],
    xp: Option<u32>,
    abilities: &[&str],
    moves: &[&str],
    total: u32,
) -> PokemonRow {
    PokemonRow::new(
        id,
        strings(types),
        xp,
        strings(abilities),
        strings(moves),
        stats_with_total(total),
    )
    .unwrap()
}

/// The three-record fixture: A fire, B fire/flying without experience, C water.
pub fn abc_table() -> PokemonTable {
    PokemonTable::from_rows(vec![
        row("A", &["fire"], Some(64), &["blaze"], &["scratch", "ember"], 300),
        row("B", &["fire", "flying"], None, &["blaze", "solar-power"], &["ember", "gust"], 250),
        row("C", &["water"], Some(60), &["torrent"], &["splash"], 200),
    ])
    .unwrap()
}

/// A PokeAPI-shaped record.
pub fn raw(name: &str, types: &[&str], xp: Option<u32>, moves: &[&str], total: u32) -> Value {
    let types: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"slot": i + 1, "type": {"name": t, "url": ""}}))
        .collect();
    let moves: Vec<Value> = moves
        .iter()
        .map(|m| json!({"move": {"name": m, "url": ""}, "version_group_details": []}))
        .collect();
    let stats: Vec<Value> = stats_with_total(total)
        .into_iter()
        .map(|(s, v)| json!({"base_stat": v, "effort": 0, "stat": {"name": s.as_str(), "url": ""}}))
        .collect();
    json!({
        "id": 1,
        "name": name,
        "base_experience": xp,
        "types": types,
        "abilities": [{"ability": {"name": "overgrow", "url": ""}, "is_hidden": false, "slot": 1}],
        "moves": moves,
        "stats": stats,
    })
}

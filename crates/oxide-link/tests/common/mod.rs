#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use oxide_link::fields::{CharField, Field, IntegerField, TextField};
use oxide_link::{
    Gateway, Model, OrmError, Result, ResultSet, Row, SharedGateway, SqlValue, Statement,
};

/// Gateway double that records every statement and replays scripted
/// responses in order. Unscripted statements succeed with one affected row.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    executed: Vec<(String, Vec<SqlValue>)>,
    responses: VecDeque<std::result::Result<ResultSet, String>>,
    insert_id: i64,
    insert_id_calls: usize,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn shared(self: &Arc<Self>) -> SharedGateway {
        Arc::clone(self) as SharedGateway
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().responses.push_back(Ok(ResultSet::from_rows(rows)));
    }

    pub fn push_failure(&self, message: &str) {
        self.state().responses.push_back(Err(message.to_string()));
    }

    pub fn set_insert_id(&self, id: i64) {
        self.state().insert_id = id;
    }

    pub fn executed(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.state().executed.clone()
    }

    pub fn last(&self) -> (String, Vec<SqlValue>) {
        self.state().executed.last().cloned().expect("no statement executed")
    }

    pub fn calls(&self) -> usize {
        self.state().executed.len()
    }

    pub fn insert_id_calls(&self) -> usize {
        self.state().insert_id_calls
    }
}

struct MockStatement<'a> {
    gateway: &'a MockGateway,
    sql: String,
}

impl Statement for MockStatement<'_> {
    fn execute(&mut self, params: &[SqlValue]) -> Result<ResultSet> {
        let mut state = self.gateway.state();
        state.executed.push((self.sql.clone(), params.to_vec()));
        match state.responses.pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(OrmError::execution(message)),
            None => Ok(ResultSet::affected(1)),
        }
    }
}

impl Gateway for MockGateway {
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn Statement + 'a>> {
        Ok(Box::new(MockStatement {
            gateway: self,
            sql: sql.to_string(),
        }))
    }

    fn last_insert_id(&self) -> Result<i64> {
        let mut state = self.state();
        state.insert_id_calls += 1;
        Ok(state.insert_id)
    }
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

pub fn user_row(id: i64, name: &str) -> Row {
    Row::new()
        .with("id", SqlValue::Int(id))
        .with("name", text(name))
}

/// `user`: auto-increment `id` primary key and a ten character `name`.
pub struct User;

impl Model for User {
    fn table_name() -> &'static str {
        "user"
    }

    fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
        vec![
            ("id", Box::new(IntegerField::auto())),
            ("name", Box::new(CharField::new(10))),
        ]
    }
}

/// `membership`: composite primary key, no auto-increment column.
pub struct Membership;

impl Model for Membership {
    fn table_name() -> &'static str {
        "membership"
    }

    fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
        use oxide_link::fields::FieldOptions;

        vec![
            (
                "team_id",
                Box::new(IntegerField::new().options(FieldOptions::new().primary_key(true))),
            ),
            (
                "user_id",
                Box::new(IntegerField::new().options(FieldOptions::new().primary_key(true))),
            ),
            ("role", Box::new(CharField::new(20).options(FieldOptions::new().default("member")))),
        ]
    }
}

/// `log`: no primary key, so stored rows cannot be located again.
pub struct Log;

impl Model for Log {
    fn table_name() -> &'static str {
        "log"
    }

    fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
        vec![("message", Box::new(TextField::new()))]
    }
}

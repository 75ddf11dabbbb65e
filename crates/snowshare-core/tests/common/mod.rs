//! Shared test helpers: an in-memory fake of the remote administrative
//! surface, a session factory over it, and a recording mailer.

// Each test binary exercises a different subset of these helpers
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use snowshare_config::{parse_config_str, ProvisioningConfig};
use snowshare_core::{CredentialsMail, Mailer};
use snowshare_errors::{ProvisionError, Result};
use snowshare_session::{ConnectTarget, Row, Session, SessionFactory};

pub const PROVIDER_ACCOUNT_ID: &str = "PROV123";
pub const READER_LOCATOR: &str = "AB12345";
pub const READER_URL: &str = "https://org-reader.snowflakecomputing.com";

/// A user as the fake remote stores it
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub password: String,
    pub email: String,
    pub default_warehouse: String,
}

/// Remote-system state shared by every session the factory hands out
#[derive(Debug, Default)]
pub struct FakeState {
    pub schemas: HashSet<String>,
    pub views: HashSet<String>,
    pub shares: HashSet<String>,
    /// account name -> (locator, url)
    pub managed_accounts: HashMap<String, (String, String)>,
    /// (share, locator)
    pub attached: HashSet<(String, String)>,
    pub warehouses: HashSet<String>,
    /// database -> "account.share" it was imported from
    pub databases: HashMap<String, String>,
    pub users: HashMap<String, UserRecord>,
    /// Every statement issued, in order
    pub log: Vec<String>,
    /// Statements containing a pattern fail with the paired message
    pub fail_on: Vec<(String, String)>,
    /// Make SHOW MANAGED ACCOUNTS return nothing for this many calls
    pub suppress_managed_lookups: usize,
    /// Make SHOW MANAGED ACCOUNTS always return nothing
    pub hide_managed_accounts: bool,
    /// Rows every COUNT(*) validation read reports
    pub view_rows: i64,
}

impl FakeState {
    pub fn new() -> Self {
        FakeState {
            view_rows: 7,
            ..FakeState::default()
        }
    }

    pub fn statements_matching(&self, pattern: &str) -> Vec<String> {
        self.log
            .iter()
            .filter(|s| s.contains(pattern))
            .cloned()
            .collect()
    }
}

pub struct FakeSession {
    state: Rc<RefCell<FakeState>>,
    closed: bool,
}

impl FakeSession {
    fn interpret(&self, statement: &str) -> Result<Vec<Row>> {
        let state = &mut *self.state.borrow_mut();
        state.log.push(statement.to_string());

        for (pattern, message) in &state.fail_on {
            if statement.contains(pattern.as_str()) {
                return Err(ProvisionError::statement(pattern.clone(), message.clone()));
            }
        }

        if statement == "SELECT CURRENT_ACCOUNT()" {
            return Ok(vec![vec![Some(PROVIDER_ACCOUNT_ID.to_string())]]);
        }
        if statement.starts_with("USE ") {
            return Ok(vec![]);
        }
        if statement.starts_with("SHOW SCHEMAS LIKE ") {
            let schema = quoted(statement);
            let database = after(statement, "IN DATABASE ");
            let key = format!("{database}.{schema}");
            return Ok(if state.schemas.contains(&key) {
                vec![vec![Some(schema)]]
            } else {
                vec![]
            });
        }
        if statement.starts_with("CREATE SCHEMA IF NOT EXISTS ") {
            let name = after(statement, "IF NOT EXISTS ");
            state.schemas.insert(name);
            return Ok(vec![]);
        }
        if statement.starts_with("CREATE OR REPLACE SECURE VIEW ") {
            let name = token(statement, 5);
            state.views.insert(name);
            return Ok(vec![]);
        }
        if statement.starts_with("CREATE OR REPLACE SHARE ") {
            state.shares.insert(token(statement, 4));
            return Ok(vec![]);
        }
        if statement.starts_with("GRANT ") {
            return Ok(vec![]);
        }
        if statement.starts_with("SHOW MANAGED ACCOUNTS LIKE ") {
            if state.suppress_managed_lookups > 0 {
                state.suppress_managed_lookups -= 1;
                return Ok(vec![]);
            }
            if state.hide_managed_accounts {
                return Ok(vec![]);
            }
            let name = quoted(statement);
            return Ok(match state.managed_accounts.get(&name) {
                Some((locator, url)) => vec![vec![
                    Some(name),
                    Some("AWS".to_string()),
                    Some("eu-west-1".to_string()),
                    Some(locator.clone()),
                    Some("2024-01-01".to_string()),
                    Some(url.clone()),
                ]],
                None => vec![],
            });
        }
        if statement.starts_with("CREATE MANAGED ACCOUNT ") {
            let name = token(statement, 3);
            if state.managed_accounts.contains_key(&name) {
                return Err(ProvisionError::statement(
                    "fake",
                    format!("Object '{name}' already exists."),
                ));
            }
            state
                .managed_accounts
                .insert(name, (READER_LOCATOR.to_string(), READER_URL.to_string()));
            return Ok(vec![]);
        }
        if statement.starts_with("ALTER SHARE ") {
            let share = token(statement, 2);
            let locator = token(statement, 6);
            if !state.attached.insert((share.clone(), locator.clone())) {
                return Err(ProvisionError::statement(
                    "fake",
                    format!("Following accounts cannot be added to this share: {locator}."),
                ));
            }
            return Ok(vec![]);
        }
        if statement.starts_with("CREATE OR REPLACE WAREHOUSE ") {
            state.warehouses.insert(token(statement, 4));
            return Ok(vec![]);
        }
        if statement.starts_with("CREATE OR REPLACE DATABASE ") {
            let name = token(statement, 4);
            let source = after(statement, "FROM SHARE ");
            state.databases.insert(name, source);
            return Ok(vec![]);
        }
        if statement.starts_with("SHOW USERS LIKE ") {
            let name = quoted(statement);
            return Ok(if state.users.contains_key(&name) {
                vec![vec![Some(name)]]
            } else {
                vec![]
            });
        }
        if statement.starts_with("CREATE USER ") {
            let name = token(statement, 2);
            if state.users.contains_key(&name) {
                return Err(ProvisionError::statement(
                    "fake",
                    format!("Object '{name}' already exists."),
                ));
            }
            state.users.insert(
                name,
                UserRecord {
                    password: keyword_value(statement, "PASSWORD"),
                    email: keyword_value(statement, "EMAIL"),
                    default_warehouse: keyword_value(statement, "DEFAULT_WAREHOUSE"),
                },
            );
            return Ok(vec![]);
        }
        if statement.starts_with("ALTER USER ") {
            let name = token(statement, 2);
            let user = state
                .users
                .get_mut(&name)
                .ok_or_else(|| ProvisionError::statement("fake", "User does not exist"))?;
            user.email = keyword_value(statement, "EMAIL");
            user.default_warehouse = keyword_value(statement, "DEFAULT_WAREHOUSE");
            return Ok(vec![]);
        }
        if statement.starts_with("SELECT COUNT(*) FROM ") {
            return Ok(vec![vec![Some(state.view_rows.to_string())]]);
        }
        panic!("fake remote cannot interpret: {statement}");
    }
}

impl Session for FakeSession {
    fn query(&mut self, statement: &str) -> Result<Vec<Row>> {
        assert!(!self.closed, "query on closed session");
        self.interpret(statement)
    }

    fn exec(&mut self, statement: &str) -> Result<()> {
        assert!(!self.closed, "exec on closed session");
        self.interpret(statement).map(|_| ())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Factory sharing one FakeState across every session it opens
pub struct FakeFactory {
    pub state: Rc<RefCell<FakeState>>,
    pub connects: RefCell<Vec<ConnectTarget>>,
}

impl FakeFactory {
    pub fn new(state: FakeState) -> Self {
        FakeFactory {
            state: Rc::new(RefCell::new(state)),
            connects: RefCell::new(Vec::new()),
        }
    }
}

impl SessionFactory for FakeFactory {
    fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Session>> {
        self.connects.borrow_mut().push(target.clone());
        Ok(Box::new(FakeSession {
            state: Rc::clone(&self.state),
            closed: false,
        }))
    }
}

/// Mailer recording every delivery; optionally failing
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: RefCell<Vec<CredentialsMail>>,
    pub fail: bool,
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &CredentialsMail) -> Result<()> {
        self.sent.borrow_mut().push(mail.clone());
        if self.fail {
            return Err(ProvisionError::Notification {
                reason: "fake transport down".to_string(),
            });
        }
        Ok(())
    }
}

/// A full configuration with a reader user and an smtp section
pub fn full_config() -> ProvisioningConfig {
    parse_config_str(
        r#"
provider:
  account: xy12345
  user: PROV_ADMIN
  password: hunter2
  role: ACCOUNTADMIN
reader:
  account_name: READER_ACCT
  admin_user: READER_ADMIN
  admin_password: s3cret
  warehouse_name: READER_WH
  db_name: READER_DB
reader_user:
  name: ANALYST
  email: analyst@example.com
  temp_password: Temp123!
share:
  name: EXCL_SHARE
data:
  provider_database: CORP_DB
  shared_schema: SHARED
  objects:
    - shared_view_name: V_ONE
      source_table: T_ONE
    - shared_view_name: V_TWO
      source_table: T_TWO
      view_where: region = 'EU'
smtp:
  host: smtp.example.com
"#,
    )
    .expect("test config must parse")
}

/// Same configuration without reader_user and smtp sections
pub fn minimal_config() -> ProvisioningConfig {
    let mut cfg = full_config();
    cfg.reader_user = None;
    cfg.smtp = None;
    cfg
}

fn quoted(statement: &str) -> String {
    let start = statement.find('\'').expect("quoted value") + 1;
    let end = statement[start..].find('\'').expect("closing quote") + start;
    statement[start..end].to_string()
}

fn token(statement: &str, index: usize) -> String {
    statement
        .split_whitespace()
        .nth(index)
        .expect("token index")
        .trim_end_matches(',')
        .to_string()
}

fn after(statement: &str, marker: &str) -> String {
    let start = statement.find(marker).expect("marker") + marker.len();
    statement[start..]
        .split_whitespace()
        .next()
        .expect("value after marker")
        .to_string()
}

fn keyword_value(statement: &str, keyword: &str) -> String {
    let marker = format!("{keyword} = '");
    let start = statement.find(&marker).map(|i| i + marker.len());
    match start {
        Some(start) => {
            let end = statement[start..].find('\'').expect("closing quote") + start;
            statement[start..end].to_string()
        }
        None => String::new(),
    }
}

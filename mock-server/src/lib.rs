//! In-memory imitation of Moodle's REST webservice endpoint.
//!
//! Serves `GET /webservice/rest/server.php`, dispatching on `wsfunction` for
//! the handful of functions the adapter calls. Like Moodle, every answer is
//! HTTP 200; failures are JSON bodies with an `exception` field.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const ENDPOINT: &str = "/webservice/rest/server.php";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub shortname: String,
    pub fullname: String,
    pub categoryid: i64,
    pub visible: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrolment {
    pub roleid: i64,
    pub userid: i64,
    pub courseid: i64,
    pub suspended: bool,
}

#[derive(Debug)]
pub struct Site {
    token: String,
    next_user_id: i64,
    users: BTreeMap<i64, User>,
    courses: Vec<Course>,
    enrolments: BTreeMap<(i64, i64), Enrolment>,
}

impl Site {
    fn new(token: String) -> Self {
        let course = |id: i64, shortname: &str, fullname: &str, categoryid: i64| Course {
            id,
            shortname: shortname.to_string(),
            fullname: fullname.to_string(),
            categoryid,
            visible: 1,
        };
        Self {
            token,
            next_user_id: 2,
            users: BTreeMap::new(),
            courses: vec![
                course(1, "site", "Mock Moodle", 0),
                course(2, "RUST101", "Introduction to Rust", 1),
                course(3, "OPS200", "Running Services", 1),
            ],
            enrolments: BTreeMap::new(),
        }
    }

    pub fn enrolments(&self) -> impl Iterator<Item = &Enrolment> {
        self.enrolments.values()
    }
}

pub type Db = Arc<RwLock<Site>>;

type Args = HashMap<String, String>;

pub fn app(token: &str) -> Router {
    router(site(token))
}

/// Router over caller-held state, so tests can inspect the site afterwards.
pub fn router(db: Db) -> Router {
    Router::new().route(ENDPOINT, get(dispatch)).with_state(db)
}

pub fn site(token: &str) -> Db {
    Arc::new(RwLock::new(Site::new(token.to_string())))
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    serve(listener, app(token)).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn dispatch(State(db): State<Db>, Query(pairs): Query<Vec<(String, String)>>) -> Json<Value> {
    let args: Args = pairs.into_iter().collect();
    let function = args.get("wsfunction").cloned().unwrap_or_default();
    tracing::debug!(%function, "webservice call");

    let mut site = db.write().await;
    if args.get("wstoken") != Some(&site.token) {
        return Json(exception(
            "moodle_exception",
            "invalidtoken",
            "Invalid token - token not found",
        ));
    }

    let result = match function.as_str() {
        "core_user_get_users" => get_users(&site, &args),
        "core_user_create_users" => create_users(&mut site, &args),
        "core_user_update_users" => update_users(&mut site, &args),
        "core_course_get_courses" => Ok(json!(site.courses)),
        "enrol_manual_enrol_users" => enrol_users(&mut site, &args),
        "enrol_manual_unenrol_users" => unenrol_users(&mut site, &args),
        _ => Err(exception(
            "dml_missing_record_exception",
            "invalidrecord",
            "Can't find data record in database table external_functions.",
        )),
    };
    Json(result.unwrap_or_else(|e| e))
}

fn exception(exception: &str, errorcode: &str, message: &str) -> Value {
    json!({ "exception": exception, "errorcode": errorcode, "message": message })
}

fn invalid_parameter(detail: &str) -> Value {
    exception(
        "invalid_parameter_exception",
        "invalidparameter",
        &format!("Invalid parameter value detected ({detail})"),
    )
}

fn required<'a>(args: &'a Args, name: &str) -> Result<&'a str, Value> {
    match args.get(name).map(String::as_str) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(invalid_parameter(&format!("Missing required key in single structure: {name}"))),
    }
}

fn required_id(args: &Args, name: &str) -> Result<i64, Value> {
    required(args, name)?
        .parse()
        .map_err(|_| invalid_parameter(&format!("{name} => Invalid parameter value detected")))
}

fn get_users(site: &Site, args: &Args) -> Result<Value, Value> {
    let key = required(args, "criteria[0][key]")?;
    let value = args.get("criteria[0][value]").map(String::as_str).unwrap_or("");
    let hit = |user: &&User| match key {
        "id" => user.id.to_string() == value,
        "username" => user.username == value,
        "email" => user.email.eq_ignore_ascii_case(value),
        "firstname" => user.firstname == value,
        "lastname" => user.lastname == value,
        _ => false,
    };
    if !matches!(key, "id" | "username" | "email" | "firstname" | "lastname") {
        return Ok(json!({
            "users": [],
            "warnings": [{
                "item": key,
                "warningcode": "invalidfieldparameter",
                "message": format!("The search key '{key}' is not supported, look at the web service documentation"),
            }],
        }));
    }
    let users: Vec<&User> = site.users.values().filter(hit).collect();
    Ok(json!({ "users": users, "warnings": [] }))
}

fn create_users(site: &mut Site, args: &Args) -> Result<Value, Value> {
    let username = required(args, "users[0][username]")?.to_string();
    if site.users.values().any(|u| u.username == username) {
        return Err(invalid_parameter(&format!("Username already exists: {username}")));
    }
    let user = User {
        id: site.next_user_id,
        username,
        firstname: required(args, "users[0][firstname]")?.to_string(),
        lastname: required(args, "users[0][lastname]")?.to_string(),
        email: required(args, "users[0][email]")?.to_string(),
    };
    site.next_user_id += 1;
    let created = json!([{ "id": user.id, "username": user.username }]);
    site.users.insert(user.id, user);
    Ok(created)
}

fn update_users(site: &mut Site, args: &Args) -> Result<Value, Value> {
    let id = required_id(args, "users[0][id]")?;
    let Some(user) = site.users.get_mut(&id) else {
        return Err(exception(
            "dml_missing_record_exception",
            "invalidrecord",
            "Can't find data record in database table user.",
        ));
    };
    for (field, slot) in [
        ("firstname", &mut user.firstname),
        ("lastname", &mut user.lastname),
        ("email", &mut user.email),
    ] {
        if let Some(value) = args.get(&format!("users[0][{field}]")) {
            *slot = value.clone();
        }
    }
    Ok(Value::Null)
}

fn enrolment_key(site: &Site, args: &Args) -> Result<(i64, i64, i64), Value> {
    let roleid = required_id(args, "enrolments[0][roleid]")?;
    let userid = required_id(args, "enrolments[0][userid]")?;
    let courseid = required_id(args, "enrolments[0][courseid]")?;
    if !site.users.contains_key(&userid) {
        return Err(exception(
            "dml_missing_record_exception",
            "invalidrecord",
            "Can't find data record in database table user.",
        ));
    }
    if !site.courses.iter().any(|c| c.id == courseid) {
        return Err(exception(
            "dml_missing_record_exception",
            "invalidrecord",
            "Can't find data record in database table course.",
        ));
    }
    Ok((roleid, userid, courseid))
}

fn enrol_users(site: &mut Site, args: &Args) -> Result<Value, Value> {
    let (roleid, userid, courseid) = enrolment_key(site, args)?;
    let suspended = args
        .get("enrolments[0][suspend]")
        .is_some_and(|v| !v.is_empty() && v != "0");
    site.enrolments.insert(
        (userid, courseid),
        Enrolment {
            roleid,
            userid,
            courseid,
            suspended,
        },
    );
    Ok(Value::Null)
}

fn unenrol_users(site: &mut Site, args: &Args) -> Result<Value, Value> {
    let (_, userid, courseid) = enrolment_key(site, args)?;
    site.enrolments.remove(&(userid, courseid));
    Ok(Value::Null)
}

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_moodle::{app, router, site, Course, Db};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "tok";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn ws_request(token: &str, function: &str, args: &str) -> Request<String> {
    let mut uri = format!(
        "/webservice/rest/server.php?wstoken={token}&wsfunction={function}&moodlewsrestformat=json"
    );
    if !args.is_empty() {
        uri.push('&');
        uri.push_str(args);
    }
    Request::builder().uri(uri).body(String::new()).unwrap()
}

/// Call the router over shared state and return the decoded body.
async fn call(db: &Db, function: &str, args: &str) -> Value {
    let resp = router(db.clone())
        .oneshot(ws_request(TOKEN, function, args))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn wrong_token_is_an_exception_with_200() {
    let resp = app(TOKEN)
        .oneshot(ws_request("nope", "core_course_get_courses", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["exception"], "moodle_exception");
    assert_eq!(body["errorcode"], "invalidtoken");
}

#[tokio::test]
async fn unknown_function_is_an_exception() {
    let db = site(TOKEN);
    let body = call(&db, "core_webservice_get_site_info", "").await;
    assert_eq!(body["exception"], "dml_missing_record_exception");
}

// --- courses ---

#[tokio::test]
async fn get_courses_lists_seeded_courses() {
    let resp = app(TOKEN)
        .oneshot(ws_request(TOKEN, "core_course_get_courses", ""))
        .await
        .unwrap();
    let courses: Vec<Course> = body_json(resp).await;
    assert_eq!(courses.len(), 3);
    assert_eq!(courses[1].shortname, "RUST101");
}

// --- users ---

#[tokio::test]
async fn create_user_requires_fields() {
    let db = site(TOKEN);
    let body = call(&db, "core_user_create_users", "users[0][username]=ada").await;
    assert_eq!(body["exception"], "invalid_parameter_exception");
}

#[tokio::test]
async fn plus_in_query_decodes_to_space() {
    let db = site(TOKEN);
    call(
        &db,
        "core_user_create_users",
        "users[0][username]=mary&users[0][createpassword]=1&users[0][firstname]=Mary+Ann\
         &users[0][lastname]=Smith&users[0][email]=mary%40example.org",
    )
    .await;
    let found = call(
        &db,
        "core_user_get_users",
        "criteria[0][key]=firstname&criteria[0][value]=Mary+Ann",
    )
    .await;
    assert_eq!(found["users"][0]["email"], "mary@example.org");
}

// --- full lifecycle ---

#[tokio::test]
async fn user_and_enrolment_lifecycle() {
    let db = site(TOKEN);

    let created = call(
        &db,
        "core_user_create_users",
        "users[0][username]=ada&users[0][createpassword]=1&users[0][firstname]=Ada\
         &users[0][lastname]=Lovelace&users[0][email]=ada%40example.org",
    )
    .await;
    let id = created[0]["id"].as_i64().unwrap();

    let updated = call(
        &db,
        "core_user_update_users",
        &format!("users[0][id]={id}&users[0][lastname]=King"),
    )
    .await;
    assert!(updated.is_null());

    let found = call(
        &db,
        "core_user_get_users",
        &format!("criteria[0][key]=id&criteria[0][value]={id}"),
    )
    .await;
    assert_eq!(found["users"][0]["lastname"], "King");

    let enrol = format!("enrolments[0][roleid]=5&enrolments[0][userid]={id}&enrolments[0][courseid]=2");
    assert!(call(&db, "enrol_manual_enrol_users", &enrol).await.is_null());
    call(&db, "enrol_manual_enrol_users", &format!("{enrol}&enrolments[0][suspend]=1")).await;
    {
        let site = db.read().await;
        let enrolments: Vec<_> = site.enrolments().collect();
        assert_eq!(enrolments.len(), 1);
        assert!(enrolments[0].suspended);
    }

    call(&db, "enrol_manual_unenrol_users", &enrol).await;
    assert_eq!(db.read().await.enrolments().count(), 0);
}

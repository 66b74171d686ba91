mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{create, id_of, ids_in, TestServer};

#[tokio::test]
async fn person_round_trip_with_business_and_deduped_tags() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    let business = create(&session, "/businesses", json!({ "name": "Acme" })).await?;
    let t1 = id_of(&create(&session, "/tags", json!({ "name": "VIP" })).await?);
    let t2 = id_of(&create(&session, "/tags", json!({ "name": "Lead" })).await?);

    let person = create(
        &session,
        "/people",
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "businessId": id_of(&business),
            "tagIds": [t1, t2, t1]
        }),
    )
    .await?;

    let fetched: Value = session
        .get(&format!("/people/{}", id_of(&person)))
        .await?
        .json()
        .await?;
    assert_eq!(fetched["firstName"], "Jane");
    assert_eq!(fetched["lastName"], "Doe");
    assert_eq!(fetched["email"], "jane@example.com");
    assert_eq!(fetched["business"]["name"], "Acme");

    let mut expected = vec![t1, t2];
    expected.sort();
    assert_eq!(ids_in(&fetched, "tags"), expected);
    Ok(())
}

#[tokio::test]
async fn person_requires_both_names() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    let res = session.post("/people", &json!({ "firstName": "Jane" })).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = session
        .post("/people", &json!({ "firstName": "  ", "lastName": "Doe" }))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn people_list_orders_by_last_then_first_name() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    for (first, last) in [("Zoe", "Adams"), ("Amy", "Baker"), ("Adam", "Adams")] {
        create(&session, "/people", json!({ "firstName": first, "lastName": last })).await?;
    }

    let list: Value = session.get("/people").await?.json().await?;
    let names: Vec<String> = list
        .as_array()
        .expect("list body is an array")
        .iter()
        .map(|p| format!("{} {}", p["firstName"].as_str().unwrap_or(""), p["lastName"].as_str().unwrap_or("")))
        .collect();
    assert_eq!(names, vec!["Adam Adams", "Zoe Adams", "Amy Baker"]);
    assert_eq!(list[0]["_count"], json!({ "tags": 0, "tasks": 0 }));
    Ok(())
}

#[tokio::test]
async fn deleting_a_tag_unlinks_it_everywhere() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    let vip = id_of(&create(&session, "/tags", json!({ "name": "VIP" })).await?);
    let lead = id_of(&create(&session, "/tags", json!({ "name": "Lead" })).await?);
    let business = create(
        &session,
        "/businesses",
        json!({ "name": "Acme", "tagIds": [vip, lead] }),
    )
    .await?;
    let person = create(
        &session,
        "/people",
        json!({ "firstName": "Jane", "lastName": "Doe", "tagIds": [vip] }),
    )
    .await?;

    let detail: Value = session.get(&format!("/tags/{}", vip)).await?.json().await?;
    assert_eq!(ids_in(&detail, "businesses"), vec![id_of(&business)]);
    assert_eq!(ids_in(&detail, "people"), vec![id_of(&person)]);

    let res = session.delete(&format!("/tags/{}", vip)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["message"], "Tag deleted");

    let business: Value = session
        .get(&format!("/businesses/{}", id_of(&business)))
        .await?
        .json()
        .await?;
    assert_eq!(ids_in(&business, "tags"), vec![lead]);
    let person: Value = session
        .get(&format!("/people/{}", id_of(&person)))
        .await?
        .json()
        .await?;
    assert!(ids_in(&person, "tags").is_empty());
    Ok(())
}

#[tokio::test]
async fn tag_and_category_names_are_unique() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    create(&session, "/tags", json!({ "name": "VIP" })).await?;
    assert_eq!(
        session.post("/tags", &json!({ "name": "VIP" })).await?.status(),
        StatusCode::CONFLICT
    );

    create(&session, "/categories", json!({ "name": "Retail" })).await?;
    assert_eq!(
        session.post("/categories", &json!({ "name": "Retail" })).await?.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        session.post("/categories", &json!({ "name": "" })).await?.status(),
        StatusCode::BAD_REQUEST
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_unlinks_businesses() -> Result<()> {
    let server = TestServer::spawn().await?;
    let session = server.signed_in().await?;

    let retail = id_of(&create(&session, "/categories", json!({ "name": "Retail" })).await?);
    let business = create(
        &session,
        "/businesses",
        json!({ "name": "Acme", "categoryIds": [retail] }),
    )
    .await?;

    let list: Value = session.get("/categories").await?.json().await?;
    assert_eq!(list[0]["_count"], json!({ "businesses": 1 }));

    let res = session.delete(&format!("/categories/{}", retail)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let business: Value = session
        .get(&format!("/businesses/{}", id_of(&business)))
        .await?
        .json()
        .await?;
    assert!(ids_in(&business, "categories").is_empty());
    Ok(())
}

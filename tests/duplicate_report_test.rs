use anyhow::Result;
use client_registry::core::importer::ImportSettings;
use client_registry::core::listing::list_clients;
use client_registry::domain::model::Field;
use client_registry::{DuplicateDetector, ImportJob, SqliteStore};
use serde_json::json;
use tempfile::TempDir;

/// Imports `csv` (header included) into a fresh in-memory store.
fn import(csv: &str) -> Result<SqliteStore> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("clients.csv");
    std::fs::write(&path, csv)?;

    let mut store = SqliteStore::open_in_memory()?;
    ImportJob::new(&mut store, ImportSettings::default()).run(&path)?;
    Ok(store)
}

#[test]
fn test_email_duplicates_ignore_null_and_empty() -> Result<()> {
    // Whitespace-only emails are trimmed and stored as ""
    let store = import(
        "nom_entreprise,courriel\n\
         A1,a@x.com\n\
         A2,a@x.com\n\
         B,b@x.com\n\
         C,\n\
         D,   \n\
         E,  \n",
    )?;
    let detector = DuplicateDetector::new(&store);

    let email = detector.single_field(Field::Email)?;
    assert_eq!(email.group_count(), 1);
    assert_eq!(email.groups[0].key, vec!["a@x.com".to_string()]);
    assert_eq!(email.groups[0].count(), 2);

    let ids: Vec<i64> = email.groups[0].members.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);

    // Only NULL is excluded here, so the two "" emails match each other
    let loose: Vec<i64> = detector
        .members_of_duplicated_values(Field::Email)?
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(loose, vec![1, 2, 5, 6]);
    Ok(())
}

#[test]
fn test_email_and_phone_report_json_shape() -> Result<()> {
    let store = import(
        "courriel,telephone\n\
         a@x.com,555\n\
         a@x.com,556\n\
         b@x.com,556\n\
         c@x.com,556\n",
    )?;

    let report = DuplicateDetector::new(&store).email_and_phone_report()?;
    let value = serde_json::to_value(&report)?;

    assert_eq!(
        value["summary"],
        json!({
            "total_duplicate_groups": 2,
            "total_email_duplicates": 2,
            "total_phone_duplicates": 3,
            "total_overall_duplicates": 5
        })
    );
    assert_eq!(value["duplicates"]["by_phone"][0]["criteria"], "telephone");
    assert_eq!(value["duplicates"]["by_phone"][0]["value"], "556");
    assert_eq!(value["duplicates"]["by_phone"][0]["count"], 3);
    assert_eq!(value["duplicates"]["by_email"][0]["clients"][1]["courriel"], "a@x.com");
    Ok(())
}

#[test]
fn test_groups_sorted_by_size_then_key() -> Result<()> {
    let store = import(
        "telephone\n\
         222\n\
         111\n\
         333\n\
         222\n\
         333\n\
         111\n\
         333\n",
    )?;

    let phone = DuplicateDetector::new(&store).single_field(Field::Phone)?;
    let order: Vec<(String, usize)> = phone
        .groups
        .iter()
        .map(|g| (g.key[0].clone(), g.count()))
        .collect();

    assert_eq!(
        order,
        vec![
            ("333".to_string(), 3),
            ("111".to_string(), 2),
            ("222".to_string(), 2),
        ]
    );
    Ok(())
}

#[test]
fn test_full_tuple_report_requires_every_field() -> Result<()> {
    let store = import(
        "nom_entreprise,telephone,courriel\n\
         Acme,555,a@x.com\n\
         Acme,555,a@x.com\n\
         Acme,555,a@x.com\n\
         Beta,556,b@x.com\n\
         Beta,556,b@x.com\n\
         Gamma,557,\n\
         Gamma,557,\n",
    )?;

    let report = DuplicateDetector::new(&store).full_tuple_report()?;
    let value = serde_json::to_value(&report)?;

    assert_eq!(value["resume"]["nombre_groupes_doublons"], 2);
    assert_eq!(value["resume"]["total_doublons"], 5);
    assert_eq!(value["resume"]["moyenne_doublons_par_groupe"], 2.5);
    assert_eq!(value["doublons"][0]["nom_entreprise"], "Acme");
    assert_eq!(value["doublons"][0]["nombre_doublons"], 3);
    assert_eq!(value["doublons"][1]["courriel"], "b@x.com");
    Ok(())
}

#[test]
fn test_full_tuple_members_match_their_group() -> Result<()> {
    let store = import(
        "nom_entreprise,telephone,courriel,ville\n\
         Beta,556,b@x.com,Laval\n\
         Acme,555,a@x.com,Laval\n\
         Acme,555,other@x.com,Laval\n\
         Gamma,557,g@x.com,Québec\n\
         Acme,555,a@x.com,Montréal\n\
         Beta,556,b@x.com,Lévis\n\
         Acme,999,a@x.com,Laval\n\
         Gamma,557,g@x.com,Laval\n\
         Acme,555,a@x.com,Laval\n\
         Delta,558,d@x.com,Laval\n",
    )?;

    let report = DuplicateDetector::new(&store).full_tuple_report()?;

    let sizes: Vec<usize> = report.doublons.iter().map(|g| g.nombre_doublons).collect();
    assert_eq!(sizes, vec![3, 2, 2]);

    let mut previous = usize::MAX;
    for group in &report.doublons {
        assert!(group.nombre_doublons <= previous);
        previous = group.nombre_doublons;

        assert_eq!(group.clients.len(), group.nombre_doublons);
        for client in &group.clients {
            assert_eq!(client.company_name.as_deref(), Some(group.nom_entreprise.as_str()));
            assert_eq!(client.phone.as_deref(), Some(group.telephone.as_str()));
            assert_eq!(client.email.as_deref(), Some(group.courriel.as_str()));
        }
        assert!(group.clients.windows(2).all(|pair| pair[0].id < pair[1].id));
    }
    Ok(())
}

#[test]
fn test_empty_table_reports_zero_average() -> Result<()> {
    let store = SqliteStore::open_in_memory()?;

    let report = DuplicateDetector::new(&store).full_tuple_report()?;

    assert!(report.doublons.is_empty());
    assert_eq!(report.resume.moyenne_doublons_par_groupe, 0.0);
    Ok(())
}

#[test]
fn test_combined_report_lists_clients_by_company() -> Result<()> {
    let store = import(
        "nom_entreprise,telephone,courriel\n\
         Zed,1,z@x.com\n\
         Acme,2,a@x.com\n\
         Zed,1,z@x.com\n\
         Acme,2,a@x.com\n\
         Solo,3,s@x.com\n",
    )?;

    let report = DuplicateDetector::new(&store).combined_report()?;

    assert_eq!(report.total_groupes_doublons, 2);
    assert_eq!(report.total_clients, 4);
    assert_eq!(report.groupes[0].nom_entreprise, "Acme");
    assert_eq!(report.groupes[0].total, 2);

    let ids: Vec<i64> = report.clients.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 4, 1, 3]);
    Ok(())
}

#[test]
fn test_field_membership_report_counts_each_field() -> Result<()> {
    let store = import(
        "nom_entreprise,telephone,courriel\n\
         Acme,1,a@x.com\n\
         Acme,2,b@x.com\n\
         Beta,2,c@x.com\n\
         Gamma,3,c@x.com\n",
    )?;

    let report = DuplicateDetector::new(&store).field_membership_report()?;
    let value = serde_json::to_value(&report)?;

    assert_eq!(
        value["counts"],
        json!({"nom_entreprise": 2, "telephone": 2, "courriel": 2})
    );
    assert_eq!(value["doublons"]["telephone"][0]["id"], 2);
    assert_eq!(value["doublons"]["courriel"][1]["nom_entreprise"], "Gamma");
    Ok(())
}

#[test]
fn test_listing_pages_by_id() -> Result<()> {
    let mut csv = String::from("nom_entreprise\n");
    for i in 1..=7 {
        csv.push_str(&format!("Company {}\n", i));
    }
    let store = import(&csv)?;

    let page = list_clients(&store, 2, 3)?;
    let value = serde_json::to_value(&page)?;

    assert_eq!(value["current_page"], 2);
    assert_eq!(value["total"], 7);
    assert_eq!(value["last_page"], 3);
    assert_eq!(value["from"], 4);
    assert_eq!(value["to"], 6);
    assert_eq!(value["data"][0]["id"], 4);

    let beyond = list_clients(&store, 9, 3)?;
    assert!(beyond.data.is_empty());
    assert_eq!(beyond.from, None);
    Ok(())
}

//! Comprehensive tests for the search engine

use chrono::{TimeZone, Utc};
use mainframe_kb_search::{
    Document, SearchConfig, SearchConfigBuilder, SearchQuery, SearchService, SearchSort,
};
use std::sync::Arc;

/// Helper to create a test search service
fn create_test_service() -> SearchService {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    SearchService::new(SearchConfig::default()).unwrap()
}

/// Helper to create a test document
fn create_test_document(id: &str, title: &str, content: &str) -> Document {
    Document::new(id, title, content)
}

#[test]
fn test_search_service_creation() {
    let service = create_test_service();
    let stats = service.stats();

    assert_eq!(stats.total_documents, 0);
    assert_eq!(stats.average_document_length, 0.0);
}

#[test]
fn test_index_single_document() {
    let service = create_test_service();

    let document = create_test_document(
        "kb-001",
        "Database connection timeout",
        "DB2 connection pool exhausted during batch window",
    );

    service.add_document(document).unwrap();

    let stats = service.stats();
    assert_eq!(stats.total_documents, 1);
    assert!(stats.total_terms > 0);
    assert!(stats.average_document_length > 0.0);
}

#[test]
fn test_index_multiple_documents() {
    let service = create_test_service();

    let documents = vec![
        create_test_document("kb-001", "API timeout", "Gateway timeout after 30s"),
        create_test_document("kb-002", "Database error", "Connection failed"),
        create_test_document("kb-003", "Security alert", "Unauthorized RACF access"),
    ];

    let indexed = service.add_documents(documents).unwrap();
    assert_eq!(indexed, 3);
    assert_eq!(service.stats().total_documents, 3);
}

#[test]
fn test_simple_text_search() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document(
                "kb-001",
                "Database connection error",
                "DB2 connection failed in region A",
            ),
            create_test_document(
                "kb-002",
                "API gateway timeout",
                "Request timeout after 30 seconds",
            ),
        ])
        .unwrap();

    let results = service.search(&SearchQuery::new("database")).unwrap();

    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "kb-001");
    assert!(results.hits[0].title.contains("Database"));
    assert!(results.hits[0].score > 0.0);
}

#[test]
fn test_domain_vocabulary_search() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document(
                "kb-001",
                "S0C7 in nightly payroll",
                "Data exception reading PROD.PAYROLL.DATA(+1); check COMP-3 fields",
            ),
            create_test_document(
                "kb-002",
                "CICS region hung",
                "Transaction backlog in region CICSPRD1",
            ),
        ])
        .unwrap();

    // Dataset names and abend codes match as single tokens, case-insensitively.
    let results = service
        .search(&SearchQuery::new("prod.payroll.data(+1)"))
        .unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "kb-001");

    let results = service.search(&SearchQuery::new("s0c7")).unwrap();
    assert_eq!(results.total_hits, 1);

    let results = service.search(&SearchQuery::new("cics")).unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "kb-002");
}

#[test]
fn test_boolean_ranking_on_fixed_corpus() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document("doc-a", "", "mainframe migration with JCL rework"),
            create_test_document("doc-b", "", "mainframe capacity planning"),
            create_test_document("doc-c", "", "JCL coding standards"),
        ])
        .unwrap();

    // Only doc-a contains both terms; it must be the only non-zero result.
    let results = service
        .search(&SearchQuery::new("mainframe AND JCL"))
        .unwrap();

    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "doc-a");
}

#[test]
fn test_term_frequency_monotonicity() {
    let service = create_test_service();

    // Same length, different frequency of the query term.
    service
        .add_documents(vec![
            create_test_document("once", "", "JCL note pad pad"),
            create_test_document("thrice", "", "JCL JCL JCL pad"),
        ])
        .unwrap();

    let results = service.search(&SearchQuery::new("jcl")).unwrap();
    assert_eq!(results.total_hits, 2);
    assert_eq!(results.hits[0].id, "thrice");
    assert!(results.hits[0].score >= results.hits[1].score);
}

#[test]
fn test_length_normalization_favors_shorter_document() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document(
                "long",
                "",
                "JCL restart steps with a great many additional words padding this entry out",
            ),
            create_test_document("short", "", "JCL restart"),
        ])
        .unwrap();

    let results = service.search(&SearchQuery::new("jcl")).unwrap();
    assert_eq!(results.hits[0].id, "short");
    assert!(results.hits[0].score >= results.hits[1].score);
}

#[test]
fn test_phrase_search() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document("kb-001", "", "the job control language reference card"),
            create_test_document("kb-002", "", "control of job scheduling language"),
        ])
        .unwrap();

    let results = service
        .search(&SearchQuery::new("\"job control language\""))
        .unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "kb-001");
}

#[test]
fn test_wildcard_search() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document("kb-001", "", "program check in step 3"),
            create_test_document("kb-002", "", "programming standards for COBOL"),
            create_test_document("kb-003", "", "capacity planning"),
        ])
        .unwrap();

    let results = service.search(&SearchQuery::new("program*")).unwrap();
    assert_eq!(results.total_hits, 2);
}

#[test]
fn test_malformed_queries_never_error() {
    let service = create_test_service();
    service
        .add_document(create_test_document("kb-001", "", "JCL restart notes"))
        .unwrap();

    for query in [
        "",
        "   ",
        "AND AND",
        "OR OR OR",
        "NOT",
        "(((",
        ")))",
        "\"unterminated",
        "AND jcl",
        "jcl AND",
        "*",
    ] {
        let result = service.search(&SearchQuery::new(query));
        assert!(result.is_ok(), "query {query:?} must not error");
    }

    // Operators glued to a real term still match it.
    assert_eq!(
        service.search(&SearchQuery::new("AND jcl")).unwrap().total_hits,
        1
    );
}

#[test]
fn test_search_with_filters() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document("kb-001", "Critical batch abend", "S0C4 in step 2")
                .with_category("batch")
                .with_tags(vec!["abend", "urgent"]),
            create_test_document("kb-002", "Minor online issue", "Slow CICS response")
                .with_category("online")
                .with_tags(vec!["performance"]),
            create_test_document("kb-003", "Batch tuning", "Sort step elapsed time")
                .with_category("batch")
                .with_tags(vec!["performance"]),
        ])
        .unwrap();

    let results = service
        .search(&SearchQuery::new("step").with_category("batch"))
        .unwrap();
    assert_eq!(results.total_hits, 2);
    assert!(results.hits.iter().all(|h| h.category == "batch"));

    let results = service
        .search(&SearchQuery::new("step").with_tags(vec!["performance"]))
        .unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].id, "kb-003");
}

#[test]
fn test_search_with_pagination() {
    let service = create_test_service();

    let documents = (0..15)
        .map(|i| create_test_document(&format!("kb-{i:03}"), "", "restart procedure entry"))
        .collect();
    service.add_documents(documents).unwrap();

    let page1 = service
        .search(&SearchQuery::new("restart").with_limit(5).with_offset(0))
        .unwrap();
    let page2 = service
        .search(&SearchQuery::new("restart").with_limit(5).with_offset(5))
        .unwrap();

    assert_eq!(page1.total_hits, 15);
    assert_eq!(page1.hits.len(), 5);
    assert_eq!(page2.hits.len(), 5);

    // Pages over an unchanged corpus are disjoint.
    for hit in &page1.hits {
        assert!(page2.hits.iter().all(|other| other.id != hit.id));
    }
}

#[test]
fn test_sort_by_date() {
    let service = create_test_service();

    let older = Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap();
    let newer = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    service
        .add_documents(vec![
            create_test_document("kb-001", "", "IPL checklist").with_last_updated(older),
            create_test_document("kb-002", "", "IPL procedure").with_last_updated(newer),
        ])
        .unwrap();

    let results = service
        .search(&SearchQuery::new("ipl").with_sort(SearchSort::Updated))
        .unwrap();
    assert_eq!(results.hits[0].id, "kb-002");
    assert_eq!(results.hits[1].id, "kb-001");
}

#[test]
fn test_delete_document() {
    let service = create_test_service();

    service
        .add_document(create_test_document("kb-001", "Test entry", "VSAM status 35"))
        .unwrap();

    assert_eq!(service.search(&SearchQuery::new("vsam")).unwrap().total_hits, 1);

    assert!(service.remove_document("kb-001"));
    assert_eq!(service.search(&SearchQuery::new("vsam")).unwrap().total_hits, 0);

    // Removing again (or a never-indexed id) is a no-op, not an error.
    assert!(!service.remove_document("kb-001"));
    assert!(!service.remove_document("kb-404"));
}

#[test]
fn test_update_document() {
    let service = create_test_service();

    service
        .add_document(create_test_document(
            "kb-001",
            "Original title",
            "Original VSAM description",
        ))
        .unwrap();

    // Re-adding the same id replaces the previous version.
    service
        .add_document(create_test_document(
            "kb-001",
            "Updated title",
            "Updated CICS description",
        ))
        .unwrap();

    assert_eq!(service.stats().total_documents, 1);
    assert_eq!(service.search(&SearchQuery::new("vsam")).unwrap().total_hits, 0);

    let results = service.search(&SearchQuery::new("updated")).unwrap();
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].title, "Updated title");
}

#[test]
fn test_snippet_round_trip_on_short_content() {
    let service = create_test_service();

    let content = "S0C7 abend while reading the payroll master file";
    service
        .add_document(create_test_document("kb-001", "", content))
        .unwrap();

    let results = service.search(&SearchQuery::new("payroll")).unwrap();
    let snippet = &results.hits[0].snippet;

    assert_eq!(
        snippet,
        "S0C7 abend while reading the <mark>payroll</mark> master file"
    );
    assert!(!snippet.contains("..."));
}

#[test]
fn test_snippet_merges_phrase_highlights() {
    let service = create_test_service();

    service
        .add_document(create_test_document(
            "kb-001",
            "",
            "see the job control language reference for details",
        ))
        .unwrap();

    let results = service
        .search(&SearchQuery::new("\"job control\" control"))
        .unwrap();
    let snippet = &results.hits[0].snippet;

    assert!(snippet.contains("<mark>job control</mark>"));
    assert!(!snippet.contains("<mark><mark>"));
    assert!(!snippet.contains("</mark></mark>"));
}

#[test]
fn test_empty_input_safety() {
    let service = create_test_service();

    // Empty corpus, empty query: nothing throws, nothing matches.
    let results = service.search(&SearchQuery::new("")).unwrap();
    assert_eq!(results.total_hits, 0);
    assert!(results.hits.is_empty());

    service
        .add_document(create_test_document("kb-001", "", ""))
        .unwrap();
    let results = service.search(&SearchQuery::new("anything")).unwrap();
    assert_eq!(results.total_hits, 0);
}

#[test]
fn test_result_contract_field_types() {
    let service = create_test_service();

    service
        .add_document(create_test_document("kb-001", "JCL restart", "JCL restart steps"))
        .unwrap();

    let results = service
        .search(&SearchQuery::new("jcl").with_highlight(false))
        .unwrap();
    let value = serde_json::to_value(&results.hits[0]).unwrap();

    assert!(value["score"].is_number());
    assert!(value["tags"].is_array());
    assert!(value["snippet"].is_string());
    assert!(value["category"].is_string());
    assert_eq!(value["id"], "kb-001");
}

#[test]
fn test_suggestions() {
    let service = create_test_service();

    service
        .add_documents(vec![
            create_test_document("kb-001", "", "JCL restart"),
            create_test_document("kb-002", "", "JCL tuning"),
            create_test_document("kb-003", "", "JCL123 meaning"),
        ])
        .unwrap();

    let suggestions = service.suggest("jcl", 5);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].text, "JCL");
    assert_eq!(suggestions[0].document_frequency, 2);
}

#[test]
fn test_concurrent_readers_with_single_writer() {
    let service = Arc::new(create_test_service());
    let total_docs = 50;

    let writer = {
        let service = Arc::clone(&service);
        std::thread::spawn(move || {
            for i in 0..total_docs {
                service
                    .add_document(create_test_document(
                        &format!("kb-{i:03}"),
                        "",
                        "JCL restart entry",
                    ))
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let results = service.search(&SearchQuery::new("jcl")).unwrap();
                    // A reader sees some consistent prefix of the writes,
                    // never a partially applied mutation.
                    assert!(results.total_hits <= total_docs);
                    assert!(results.hits.len() <= results.total_hits.min(20));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(
        service.search(&SearchQuery::new("jcl")).unwrap().total_hits,
        total_docs
    );
}

#[test]
fn test_configured_engine_end_to_end() {
    let config = SearchConfigBuilder::new()
        .custom_terms(vec!["PAYRL", "GLAPP"])
        .k1(1.4)
        .b(0.6)
        .snippet_max_length(120)
        .highlight_tag("em")
        .ellipsis(" […]")
        .build();
    let service = SearchService::new(config).unwrap();

    service
        .add_document(create_test_document(
            "kb-001",
            "PAYRL cycle failed",
            "The payrl nightly cycle abended in GLAPP interface step",
        ))
        .unwrap();

    let results = service.search(&SearchQuery::new("payrl")).unwrap();
    assert_eq!(results.total_hits, 1);
    assert!(results.hits[0].snippet.contains("<em>payrl</em>"));
}

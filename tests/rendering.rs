use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use platform_report::config::ReportConfig;
use platform_report::fonts;
use platform_report::model::{
    Demographics, EventRecord, FeedbackAnalytics, FeedbackRecord, MetricsSnapshot, PostRecord,
    RatingPoint, ReportFilters, ReportRequest, ReportWindow, UserRecord,
};
use platform_report::{build_report, GeneratedReport};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "fonts missing. Set PLATFORM_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn frozen_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, 16)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

fn counts(entries: &[(&str, u64)]) -> IndexMap<String, u64> {
    entries
        .iter()
        .map(|(label, count)| (label.to_string(), *count))
        .collect()
}

fn sample_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        total_users: 120,
        total_active_users: 96,
        total_inactive_users: 24,
        total_posts: 45,
        active_posts: 40,
        hidden_posts: 5,
        total_events: 12,
        done_events: 6,
        ongoing_events: 2,
        upcoming_events: 4,
        total_hotlines: 7,
        total_feedbacks: 30,
        demographics: Some(Demographics {
            gender: Some(counts(&[("Female", 64), ("Male", 52), ("Other", 4)])),
            age_groups: Some(counts(&[("18-25", 30), ("26-35", 50), ("36-50", 40)])),
        }),
        feedback_analytics: Some(FeedbackAnalytics {
            average_rating: 4.1,
            rating_distribution: Some(
                [(5, 14), (4, 8), (3, 4), (2, 2), (1, 2)]
                    .into_iter()
                    .collect(),
            ),
            category_distribution: Some(counts(&[("UI/UX", 12), ("Bug", 10), ("Feature", 8)])),
            rating_by_category: Some(
                [("UI/UX".to_string(), 4.5), ("Bug".to_string(), 2.0)]
                    .into_iter()
                    .collect(),
            ),
            rating_over_time: Some(vec![
                RatingPoint::new("May", 3.6),
                RatingPoint::new("Jun", 3.8),
                RatingPoint::new("Jul", 4.0),
                RatingPoint::new("Aug", 3.9),
                RatingPoint::new("Sep", 4.2),
            ]),
        }),
        recent_users: (0..15)
            .map(|index| UserRecord {
                name: Some(format!("Resident {index}")),
                email: Some(format!("resident{index}@example.com")),
                role: Some("resident".into()),
                status: Some("active".into()),
                created_at: Some("2024-09-01T08:00:00Z".into()),
            })
            .collect(),
        recent_posts: vec![PostRecord {
            title: Some("Water interruption schedule for the northern district".into()),
            author: None,
            status: Some("visible".into()),
            created_at: Some("2024-10-01".into()),
        }],
        recent_feedback: vec![FeedbackRecord {
            user: Some("Ana".into()),
            rating: Some(5),
            category: Some("UI/UX".into()),
            comment: Some("Love the new event calendar".into()),
            created_at: None,
        }],
        upcoming_five_events: vec![EventRecord {
            title: Some("Coastal clean-up".into()),
            date: Some("2024-10-26".into()),
            location: Some("Seaside park".into()),
            status: Some("upcoming".into()),
        }],
    }
}

fn sample_request() -> ReportRequest {
    ReportRequest::new(sample_snapshot(), "Monthly Analytics Report")
        .with_window(ReportWindow::Monthly {
            year: 2024,
            month: 9,
        })
        .with_filters(ReportFilters {
            rating: Some(5),
            category: None,
        })
}

fn render_sample_report() -> Option<GeneratedReport> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let report = build_report(&sample_request(), &ReportConfig::default(), frozen_now())
        .expect("render sample report");
    Some(report)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let date_tags: [&[u8]; 3] = [b"/CreationDate(", b"/ModDate(", b"/Producer("];
    let xmp_tags: [(&[u8], &[u8]); 6] = [
        (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ];

    let mut normalized = bytes.to_vec();
    for tag in date_tags {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in xmp_tags {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_a_pdf_with_the_suggested_filename() {
    let Some(report) = render_sample_report() else {
        eprintln!("Skipping renders_a_pdf_with_the_suggested_filename: {SKIP_HINT}");
        return;
    };

    assert!(report.bytes.starts_with(b"%PDF"), "output should be a PDF");
    assert_eq!(report.filename, "Community_Platform_Monthly_September_2024.pdf");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(first), Some(second)) = (render_sample_report(), render_sample_report()) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_HINT}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn sparse_snapshots_still_render() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping sparse_snapshots_still_render: {SKIP_HINT}");
        return;
    }

    let snapshot = MetricsSnapshot {
        total_hotlines: 3,
        ..MetricsSnapshot::default()
    };
    let report = build_report(
        &ReportRequest::new(snapshot, "Hotline Report"),
        &ReportConfig::default(),
        frozen_now(),
    )
    .expect("placeholders keep sparse reports renderable");

    assert!(!report.bytes.is_empty());
    assert_eq!(report.filename, "Community_Platform_Current_2024-10-16.pdf");
}

#[test]
fn invalid_windows_are_rejected_before_rendering() {
    let request = ReportRequest::new(sample_snapshot(), "Broken").with_window(
        ReportWindow::Quarterly {
            year: 2024,
            quarter: 5,
        },
    );

    let result = build_report(&request, &ReportConfig::default(), frozen_now());
    assert!(matches!(
        result,
        Err(platform_report::ReportError::InvalidRequest(_))
    ));
}

#[test]
fn charts_taller_than_a_page_still_render() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping charts_taller_than_a_page_still_render: {SKIP_HINT}");
        return;
    }

    let labels = (1..=45)
        .map(|index| (format!("Category {index:02}"), index as u64))
        .collect::<IndexMap<_, _>>();
    let mut snapshot = sample_snapshot();
    if let Some(analytics) = snapshot.feedback_analytics.as_mut() {
        analytics.category_distribution = Some(labels.clone());
    }
    if let Some(demographics) = snapshot.demographics.as_mut() {
        demographics.age_groups = Some(labels);
    }

    let report = build_report(
        &ReportRequest::new(snapshot, "Busy Month"),
        &ReportConfig::default(),
        frozen_now(),
    )
    .expect("tall charts shrink instead of aborting the report");

    assert!(report.bytes.starts_with(b"%PDF"));
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarked_reports_carry_an_outline() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping bookmarked_reports_carry_an_outline: {SKIP_HINT}");
        return;
    }

    let report = platform_report::build_report_with_bookmarks(
        &sample_request(),
        &ReportConfig::default(),
        frozen_now(),
    )
    .expect("render bookmarked report");

    let needle = b"/Outlines";
    assert!(report
        .bytes
        .windows(needle.len())
        .any(|window| window == needle));
}

#[cfg(feature = "bookmarks")]
#[test]
fn outline_entries_point_at_section_pages_in_order() {
    use lopdf::{Document, Object};

    if !fonts::default_fonts_available() {
        eprintln!("Skipping outline_entries_point_at_section_pages_in_order: {SKIP_HINT}");
        return;
    }

    let report = platform_report::build_report_with_bookmarks(
        &sample_request(),
        &ReportConfig::default(),
        frozen_now(),
    )
    .expect("render bookmarked report");

    let document = Document::load_mem(&report.bytes).expect("parse rendered PDF");
    let page_numbers = document
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect::<std::collections::HashMap<_, _>>();

    let outlines = document
        .catalog()
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(Object::as_reference)
        .and_then(|id| document.get_dictionary(id))
        .expect("outline root");

    let mut entries = Vec::new();
    let mut next = outlines.get(b"First").and_then(Object::as_reference).ok();
    while let Some(id) = next {
        let entry = document.get_dictionary(id).expect("outline entry");
        let title = entry
            .get(b"Title")
            .and_then(Object::as_string)
            .expect("entry title")
            .into_owned();
        let page_ref = entry
            .get(b"Dest")
            .and_then(Object::as_array)
            .and_then(|dest| dest[0].as_reference())
            .expect("entry destination");
        entries.push((title, page_numbers[&page_ref]));
        next = entry.get(b"Next").and_then(Object::as_reference).ok();
    }

    let titles = entries
        .iter()
        .map(|(title, _)| title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        titles,
        [
            "Executive Summary",
            "Statistics",
            "Demographics",
            "Feedback Analytics",
            "Recent Activity"
        ]
    );

    let pages = entries.iter().map(|(_, page)| *page).collect::<Vec<_>>();
    assert_eq!(pages[0], 1);
    assert!(pages.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(pages[pages.len() - 1] as usize <= page_numbers.len());
}

//! Report rendering
//!
//! Turns aggregated groups into the text blocks sent to subscribers and the
//! records persisted for them.

use crate::batch::{GroupStatus, GroupSummary, UnloadDuration};
use crate::shipment::timestamp::{format_date, format_timestamp, MISSING};
use crate::storage::GroupRecord;
use chrono::{NaiveDate, NaiveDateTime};

/// Pattern of the run stamp inside report ids
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One rendered group of a source report
#[derive(Debug, Clone)]
pub struct ReportUnit {
    /// 1-based position in the source report
    pub index: u32,
    pub text: String,
    pub summary: GroupSummary,
    pub record: GroupRecord,
}

/// Fields recovered from a rendered block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedFields {
    pub status: GroupStatus,
    pub duration_seconds: i64,
}

/// `GROUP_{run stamp}_{source}_{index}`
pub fn report_id(run_stamp: NaiveDateTime, source_id: &str, index: u32) -> String {
    format!(
        "GROUP_{}_{}_{}",
        run_stamp.format(RUN_STAMP_FORMAT),
        source_id,
        index
    )
}

fn optional_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|ts| format_timestamp(&ts))
        .unwrap_or_else(|| MISSING.to_string())
}

/// Renders one group block
///
/// Every line ends with a newline, including the last one.
pub fn render_group(index: u32, date: NaiveDate, summary: &GroupSummary) -> String {
    format!(
        "Group: {}\n\
         Date: {}\n\
         Arrival window: {} – {}\n\
         Closed at: {}\n\
         Unload started: {}\n\
         Unload duration: {}\n\
         Status: {}\n\
         Boxes: {}\n\
         Sent: {}\n\
         Received: {}\n\
         Excess: {}\n",
        index,
        format_date(&date),
        summary.first_created.format("%H:%M"),
        summary.last_created.format("%H:%M"),
        optional_timestamp(summary.closed_at),
        optional_timestamp(summary.unload_started_at),
        summary.duration,
        summary.status,
        summary.count,
        summary.sent,
        summary.received,
        summary.excess,
    )
}

/// Renders a group and derives its persistence record
pub fn build_report_unit(
    source_id: &str,
    index: u32,
    date: NaiveDate,
    summary: GroupSummary,
    run_stamp: NaiveDateTime,
) -> ReportUnit {
    let text = render_group(index, date, &summary);
    let record = GroupRecord {
        report_id: report_id(run_stamp, source_id, index),
        source_id: source_id.to_string(),
        delivery_date: format_date(&date),
        created_at: format_timestamp(&summary.first_created),
        unload_started_at: summary.unload_started_at.map(|ts| format_timestamp(&ts)),
        closed_at: summary.closed_at.map(|ts| format_timestamp(&ts)),
        status: summary.status,
        sent: summary.sent,
        received: summary.received,
        excess: summary.excess,
        group_index: index,
        boxes_count: u32::try_from(summary.count).unwrap_or(u32::MAX),
        unload_duration_seconds: summary.duration.persisted_seconds(),
        run_stamp: format_timestamp(&run_stamp),
    };

    ReportUnit {
        index,
        text,
        summary,
        record,
    }
}

/// Full message for one source: a header line, a blank line, then the
/// group blocks separated by blank lines
pub fn render_source_report(source_id: &str, units: &[ReportUnit]) -> String {
    let blocks: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
    format!("📍 Source: {}\n\n{}", source_id, blocks.join("\n"))
}

/// Reads status and duration back out of a rendered block
pub fn parse_report_fields(text: &str) -> Option<RenderedFields> {
    let mut status = None;
    let mut duration_seconds = None;

    for line in text.lines() {
        if let Some(value) = line.strip_prefix("Status: ") {
            status = GroupStatus::from_label(value);
        } else if let Some(value) = line.strip_prefix("Unload duration: ") {
            duration_seconds = UnloadDuration::parse_seconds(value);
        }
    }

    Some(RenderedFields {
        status: status?,
        duration_seconds: duration_seconds?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::test_support::{at, shipment};
    use crate::batch::{group_shipments, Group};
    use crate::shipment::{DetailMetrics, ShipmentStatus};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn night_group() -> Group {
        let mut a = shipment("N1", 2, 10, ShipmentStatus::Closed);
        a.unload_started_at = Some(at(2, 15));
        a.closed_at = Some(at(2, 40));
        a.metrics = DetailMetrics {
            sent: 10,
            received: 9,
            excess: 1,
        };
        let mut b = shipment("N2", 2, 50, ShipmentStatus::Closed);
        b.closed_at = Some(at(3, 0));
        b.metrics = DetailMetrics {
            sent: 5,
            received: 5,
            excess: 0,
        };
        Group::new(vec![a, b]).unwrap()
    }

    #[test]
    fn test_render_closed_group() {
        let summary = GroupSummary::compute(&night_group(), at(12, 0));
        let text = render_group(3, date(), &summary);

        assert_eq!(
            text,
            "Group: 3\n\
             Date: 2024-05-10\n\
             Arrival window: 02:10 – 02:50\n\
             Closed at: 2024-05-10 03:00:00\n\
             Unload started: 2024-05-10 02:15:00\n\
             Unload duration: 0:45:00\n\
             Status: Closed\n\
             Boxes: 2\n\
             Sent: 15\n\
             Received: 14\n\
             Excess: 1\n"
        );
    }

    #[test]
    fn test_render_pending_group_uses_placeholders() {
        let group = Group::new(vec![shipment("D1", 9, 0, ShipmentStatus::Pending)]).unwrap();
        let summary = GroupSummary::compute(&group, at(12, 0));
        let text = render_group(1, date(), &summary);

        assert!(text.contains("Arrival window: 09:00 – 09:00\n"));
        assert!(text.contains("Closed at: -\n"));
        assert!(text.contains("Unload started: -\n"));
        assert!(text.contains("Unload duration: 0:00:00\n"));
        assert!(text.contains("Status: Pending\n"));
    }

    #[test]
    fn test_report_unit_record() {
        let summary = GroupSummary::compute(&night_group(), at(12, 0));
        let unit = build_report_unit("site1", 3, date(), summary, at(12, 0));

        assert_eq!(unit.record.report_id, "GROUP_20240510_120000_site1_3");
        assert_eq!(unit.record.delivery_date, "2024-05-10");
        assert_eq!(unit.record.created_at, "2024-05-10 02:10:00");
        assert_eq!(
            unit.record.closed_at.as_deref(),
            Some("2024-05-10 03:00:00")
        );
        assert_eq!(unit.record.status, GroupStatus::Closed);
        assert_eq!(unit.record.boxes_count, 2);
        assert_eq!(unit.record.unload_duration_seconds, 2700);
        assert_eq!(unit.record.run_stamp, "2024-05-10 12:00:00");
    }

    #[test]
    fn test_open_group_persists_zero_duration() {
        let mut member = shipment("D1", 9, 0, ShipmentStatus::InProgress);
        member.unload_started_at = Some(at(9, 30));
        let group = Group::new(vec![member]).unwrap();

        let summary = GroupSummary::compute(&group, at(10, 0));
        let unit = build_report_unit("site1", 1, date(), summary, at(10, 0));

        assert!(unit.text.contains("Unload duration: 0:30:00\n"));
        assert_eq!(unit.record.unload_duration_seconds, 0);
        assert_eq!(unit.record.closed_at, None);
    }

    #[test]
    fn test_rendered_fields_parse_back() {
        let mut in_progress = shipment("D1", 9, 0, ShipmentStatus::InProgress);
        in_progress.unload_started_at = Some(at(9, 30));

        let groups = group_shipments(vec![
            in_progress,
            shipment("D2", 13, 0, ShipmentStatus::Pending),
        ])
        .into_iter()
        .chain(std::iter::once(night_group()));

        for (i, group) in groups.enumerate() {
            let summary = GroupSummary::compute(&group, at(11, 5));
            let text = render_group(i as u32 + 1, date(), &summary);
            let fields = parse_report_fields(&text).unwrap();

            assert_eq!(fields.status, summary.status);
            assert_eq!(fields.duration_seconds, summary.duration.seconds);
        }
    }

    #[test]
    fn test_parse_report_fields_rejects_incomplete_block() {
        assert_eq!(parse_report_fields("Group: 1\nStatus: Closed\n"), None);
        assert_eq!(
            parse_report_fields("Status: Unknown\nUnload duration: 0:00:01\n"),
            None
        );
    }

    #[test]
    fn test_render_source_report() {
        let first = build_report_unit(
            "site1",
            1,
            date(),
            GroupSummary::compute(
                &Group::new(vec![shipment("D1", 13, 0, ShipmentStatus::Pending)]).unwrap(),
                at(14, 0),
            ),
            at(14, 0),
        );
        let second = build_report_unit(
            "site1",
            2,
            date(),
            GroupSummary::compute(&night_group(), at(14, 0)),
            at(14, 0),
        );

        let report = render_source_report("site1", &[first.clone(), second.clone()]);

        assert!(report.starts_with("📍 Source: site1\n\nGroup: 1\n"));
        assert_eq!(
            report,
            format!("📍 Source: site1\n\n{}\n{}", first.text, second.text)
        );
    }
}

//! Narrative insights derived from a [`MetricsSnapshot`].
//!
//! [`derive_insights`] is pure and deterministic.  Every percentage is rounded half up and every
//! divisor is guarded, so a sparse or inconsistent snapshot produces shorter text rather than
//! `NaN`s.  A section that has nothing to say is left as an empty string.

use indexmap::IndexMap;

use crate::model::{FeedbackAnalytics, LabelCounts, MetricsSnapshot, RatingPoint};

/// Narrative text per report section; an empty string means "omit this section".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsightBundle {
    pub summary: String,
    pub demographics: String,
    pub feedback: String,
    pub hotlines: String,
    pub posts: String,
    pub events: String,
}

impl InsightBundle {
    /// Non-empty sections in report order, paired with their headings.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("Overview", self.summary.as_str()),
            ("Demographics", self.demographics.as_str()),
            ("Feedback", self.feedback.as_str()),
            ("Hotlines", self.hotlines.as_str()),
            ("Posts", self.posts.as_str()),
            ("Events", self.events.as_str()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }
}

/// Direction of the latest change in average rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingTrend {
    Improving,
    Declining,
    Stable,
}

impl RatingTrend {
    fn as_str(self) -> &'static str {
        match self {
            RatingTrend::Improving => "improving",
            RatingTrend::Declining => "declining",
            RatingTrend::Stable => "stable",
        }
    }
}

/// Derives every insight section from `snapshot`.
pub fn derive_insights(snapshot: &MetricsSnapshot) -> InsightBundle {
    InsightBundle {
        summary: summary(snapshot),
        demographics: demographics(snapshot),
        feedback: feedback(snapshot),
        hotlines: hotlines(snapshot),
        posts: posts(snapshot),
        events: events(snapshot),
    }
}

/// `round(100 * part / whole)` rounded half up, `0` when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64 + 0.5).floor() as u64
}

fn summary(snapshot: &MetricsSnapshot) -> String {
    if snapshot.total_users == 0 {
        return String::new();
    }

    let mut sentences = vec![format!(
        "The platform shows a {}% user activity rate.",
        percent(snapshot.total_active_users, snapshot.total_users)
    )];

    if snapshot.total_posts > 0 {
        let per_user = snapshot.total_posts as f64 / snapshot.total_users as f64;
        sentences.push(format!(
            "Users have created an average of {per_user:.1} posts each."
        ));
    }

    if snapshot.upcoming_events > 0 {
        sentences.push(format!(
            "{} upcoming {} scheduled.",
            snapshot.upcoming_events,
            plural(snapshot.upcoming_events, "event is", "events are")
        ));
    }

    sentences.join(" ")
}

fn demographics(snapshot: &MetricsSnapshot) -> String {
    let Some(demographics) = &snapshot.demographics else {
        return String::new();
    };

    let mut sentences = Vec::new();

    if let Some((gender, count)) = demographics.gender.as_ref().and_then(argmax_count) {
        sentences.push(format!(
            "The largest gender group is {gender} at {}% of users.",
            percent(count, snapshot.total_users)
        ));
    }

    if let Some((age_group, count)) = demographics.age_groups.as_ref().and_then(argmax_count) {
        sentences.push(format!(
            "The most represented age group is {age_group} ({}% of users).",
            percent(count, snapshot.total_users)
        ));
    }

    sentences.join(" ")
}

fn feedback(snapshot: &MetricsSnapshot) -> String {
    if snapshot.total_feedbacks == 0 {
        return String::new();
    }

    let analytics = snapshot.feedback_analytics.as_ref();
    let average = analytics
        .map(|analytics| clamp_rating(analytics.average_rating))
        .unwrap_or(0.0);

    let mut sentences = vec![format!(
        "{} feedback {} received with an average rating of {average:.1} out of 5.",
        snapshot.total_feedbacks,
        plural(snapshot.total_feedbacks, "entry was", "entries were")
    )];

    let Some(analytics) = analytics else {
        return sentences.join(" ");
    };

    if let Some(distribution) = &analytics.rating_distribution {
        sentences.push(format!(
            "{}% of ratings are five stars.",
            five_star_percentage(distribution)
        ));
    }

    if let Some(trend) = rating_trend(analytics) {
        sentences.push(format!(
            "Ratings are {} compared to the previous period.",
            trend.as_str()
        ));
    }

    if let Some(((best, best_rating), (worst, worst_rating))) = category_extremes(analytics) {
        sentences.push(format!(
            "{best} has the highest average rating ({best_rating:.1}), \
             while {worst} has the lowest ({worst_rating:.1})."
        ));
    }

    sentences.join(" ")
}

fn hotlines(snapshot: &MetricsSnapshot) -> String {
    if snapshot.total_hotlines == 0 {
        return String::new();
    }

    format!(
        "{} emergency {} available to the community.",
        snapshot.total_hotlines,
        plural(snapshot.total_hotlines, "hotline is", "hotlines are")
    )
}

fn posts(snapshot: &MetricsSnapshot) -> String {
    let mut sentences = Vec::new();

    if snapshot.total_posts > 0 {
        sentences.push(format!(
            "{}% of {} {} currently visible.",
            percent(snapshot.active_posts, snapshot.total_posts),
            snapshot.total_posts,
            plural(snapshot.total_posts, "post is", "posts are")
        ));
    }

    let recent = snapshot.recent_posts.len() as u64;
    if recent > 0 {
        sentences.push(format!(
            "{recent} recent {} listed below.",
            plural(recent, "post is", "posts are")
        ));
    }

    sentences.join(" ")
}

fn events(snapshot: &MetricsSnapshot) -> String {
    let mut sentences = Vec::new();

    if snapshot.total_events > 0 {
        sentences.push(format!(
            "{}% of {} {} upcoming.",
            percent(snapshot.upcoming_events, snapshot.total_events),
            snapshot.total_events,
            plural(snapshot.total_events, "event is", "events are")
        ));
    }

    if snapshot.ongoing_events > 0 {
        sentences.push(format!(
            "{} {} currently ongoing.",
            snapshot.ongoing_events,
            plural(snapshot.ongoing_events, "event is", "events are")
        ));
    }

    if !snapshot.upcoming_five_events.is_empty() {
        sentences.push("The next event is already on the calendar.".to_string());
    }

    sentences.join(" ")
}

/// Share of five-star ratings among all ratings.
pub fn five_star_percentage(distribution: &IndexMap<u8, u64>) -> u64 {
    let total = distribution.values().sum();
    percent(distribution.get(&5).copied().unwrap_or(0), total)
}

/// Compares the last two periods of `rating_over_time`.
pub fn rating_trend(analytics: &FeedbackAnalytics) -> Option<RatingTrend> {
    let series: &[RatingPoint] = analytics.rating_over_time.as_deref()?;
    let [.., previous, latest] = series else {
        return None;
    };

    let (previous, latest) = (clamp_rating(previous.average), clamp_rating(latest.average));
    Some(if latest > previous {
        RatingTrend::Improving
    } else if latest < previous {
        RatingTrend::Declining
    } else {
        RatingTrend::Stable
    })
}

type CategoryRating<'a> = (&'a str, f64);

/// Best and worst rated categories, when at least two differ.
pub fn category_extremes(
    analytics: &FeedbackAnalytics,
) -> Option<(CategoryRating<'_>, CategoryRating<'_>)> {
    let ratings = analytics.rating_by_category.as_ref()?;
    if ratings.len() < 2 {
        return None;
    }

    let mut entries = ratings
        .iter()
        .map(|(category, rating)| (category.as_str(), clamp_rating(*rating)));
    let first = entries.next()?;
    let (best, worst) = entries.fold((first, first), |(best, worst), entry| {
        (
            if entry.1 > best.1 { entry } else { best },
            if entry.1 < worst.1 { entry } else { worst },
        )
    });

    if best.0 == worst.0 {
        None
    } else {
        Some((best, worst))
    }
}

/// Entry with the highest count; ties resolve to the first in insertion order.
fn argmax_count(counts: &LabelCounts) -> Option<(&str, u64)> {
    counts
        .iter()
        .fold(None, |best: Option<(&str, u64)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((label.as_str(), *count)),
        })
}

pub(crate) fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, 5.0)
    } else {
        0.0
    }
}

fn plural(count: u64, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Demographics;

    fn labels(pairs: &[(&str, u64)]) -> LabelCounts {
        pairs
            .iter()
            .map(|(label, count)| (label.to_string(), *count))
            .collect()
    }

    #[test]
    fn summary_is_empty_without_users() {
        let snapshot = MetricsSnapshot {
            total_posts: 12,
            upcoming_events: 3,
            ..MetricsSnapshot::default()
        };
        assert_eq!(derive_insights(&snapshot).summary, "");
    }

    #[test]
    fn summary_reports_activity_rate() {
        let snapshot = MetricsSnapshot {
            total_users: 100,
            total_active_users: 80,
            ..MetricsSnapshot::default()
        };
        let summary = derive_insights(&snapshot).summary;
        assert!(summary.starts_with("The platform shows a 80% user activity rate."));
        assert!(!summary.contains("posts"));
    }

    #[test]
    fn summary_appends_posts_per_user_and_upcoming_events() {
        let snapshot = MetricsSnapshot {
            total_users: 4,
            total_active_users: 3,
            total_posts: 10,
            upcoming_events: 1,
            ..MetricsSnapshot::default()
        };
        assert_eq!(
            derive_insights(&snapshot).summary,
            "The platform shows a 75% user activity rate. \
             Users have created an average of 2.5 posts each. \
             1 upcoming event is scheduled."
        );
    }

    #[test]
    fn percent_rounds_half_up_and_guards_zero() {
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn five_star_share_of_distribution() {
        let distribution: IndexMap<u8, u64> =
            [(5, 10), (4, 5), (3, 0), (2, 0), (1, 5)].into_iter().collect();
        assert_eq!(five_star_percentage(&distribution), 50);
        assert_eq!(five_star_percentage(&IndexMap::new()), 0);
    }

    #[test]
    fn category_extremes_name_best_and_worst() {
        let snapshot = MetricsSnapshot {
            total_feedbacks: 8,
            feedback_analytics: Some(FeedbackAnalytics {
                average_rating: 3.3,
                rating_by_category: Some(
                    [("UI/UX".to_string(), 4.5), ("Bug".to_string(), 2.0)]
                        .into_iter()
                        .collect(),
                ),
                ..FeedbackAnalytics::default()
            }),
            ..MetricsSnapshot::default()
        };

        let feedback = derive_insights(&snapshot).feedback;
        assert!(feedback.contains("average rating of 3.3 out of 5"));
        assert!(feedback.contains("UI/UX has the highest average rating (4.5)"));
        assert!(feedback.contains("Bug has the lowest (2.0)"));
    }

    #[test]
    fn category_extremes_need_two_distinct_categories() {
        let single = FeedbackAnalytics {
            rating_by_category: Some([("Bug".to_string(), 2.0)].into_iter().collect()),
            ..FeedbackAnalytics::default()
        };
        assert_eq!(category_extremes(&single), None);

        let tied = FeedbackAnalytics {
            rating_by_category: Some(
                [("A".to_string(), 3.0), ("B".to_string(), 3.0)]
                    .into_iter()
                    .collect(),
            ),
            ..FeedbackAnalytics::default()
        };
        assert_eq!(category_extremes(&tied), None);
    }

    #[test]
    fn trend_compares_last_two_periods() {
        let analytics = |values: &[f64]| FeedbackAnalytics {
            rating_over_time: Some(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| RatingPoint::new(format!("W{i}"), *v))
                    .collect(),
            ),
            ..FeedbackAnalytics::default()
        };

        assert_eq!(rating_trend(&analytics(&[4.0, 3.0, 3.5])), Some(RatingTrend::Improving));
        assert_eq!(rating_trend(&analytics(&[3.0, 4.0, 3.5])), Some(RatingTrend::Declining));
        assert_eq!(rating_trend(&analytics(&[4.0, 4.0])), Some(RatingTrend::Stable));
        assert_eq!(rating_trend(&analytics(&[4.0])), None);
        assert_eq!(rating_trend(&FeedbackAnalytics::default()), None);
    }

    #[test]
    fn feedback_is_empty_without_entries() {
        let snapshot = MetricsSnapshot {
            feedback_analytics: Some(FeedbackAnalytics {
                average_rating: 4.0,
                ..FeedbackAnalytics::default()
            }),
            ..MetricsSnapshot::default()
        };
        assert_eq!(derive_insights(&snapshot).feedback, "");
    }

    #[test]
    fn demographics_pick_first_of_tied_groups() {
        let snapshot = MetricsSnapshot {
            total_users: 10,
            demographics: Some(Demographics {
                gender: Some(labels(&[("Female", 4), ("Male", 4), ("Other", 2)])),
                age_groups: Some(labels(&[("18-25", 3), ("26-35", 6), ("36-50", 1)])),
            }),
            ..MetricsSnapshot::default()
        };

        let text = derive_insights(&snapshot).demographics;
        assert_eq!(
            text,
            "The largest gender group is Female at 40% of users. \
             The most represented age group is 26-35 (60% of users)."
        );
    }

    #[test]
    fn demographics_halves_are_independent() {
        let snapshot = MetricsSnapshot {
            total_users: 0,
            demographics: Some(Demographics {
                gender: Some(LabelCounts::new()),
                age_groups: Some(labels(&[("18-25", 3)])),
            }),
            ..MetricsSnapshot::default()
        };

        assert_eq!(
            derive_insights(&snapshot).demographics,
            "The most represented age group is 18-25 (0% of users)."
        );
    }

    #[test]
    fn posts_and_events_guard_zero_totals() {
        let bundle = derive_insights(&MetricsSnapshot::default());
        assert_eq!(bundle, InsightBundle::default());
        assert!(bundle.is_empty());
    }

    #[test]
    fn events_mention_ongoing_and_next_event() {
        let snapshot = MetricsSnapshot {
            total_events: 8,
            upcoming_events: 2,
            ongoing_events: 1,
            upcoming_five_events: vec![Default::default()],
            ..MetricsSnapshot::default()
        };
        assert_eq!(
            derive_insights(&snapshot).events,
            "25% of 8 events are upcoming. 1 event is currently ongoing. \
             The next event is already on the calendar."
        );
    }

    #[test]
    fn hotlines_and_posts_sentences() {
        let snapshot = MetricsSnapshot {
            total_hotlines: 1,
            total_posts: 3,
            active_posts: 2,
            recent_posts: vec![Default::default(); 2],
            ..MetricsSnapshot::default()
        };
        let bundle = derive_insights(&snapshot);
        assert_eq!(bundle.hotlines, "1 emergency hotline is available to the community.");
        assert_eq!(
            bundle.posts,
            "67% of 3 posts are currently visible. 2 recent posts are listed below."
        );
    }
}

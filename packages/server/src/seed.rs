use common::{BadgeCategory, BadgeMetric, UserRole};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapConfig;
use crate::entity::{badge, title, user};
use crate::utils::hash;

struct BadgeSeed {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    category: BadgeCategory,
    metric: BadgeMetric,
    threshold: i32,
}

const fn challenge_badge(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    threshold: i32,
) -> BadgeSeed {
    BadgeSeed {
        key,
        name,
        description,
        category: BadgeCategory::ChallengeMilestone,
        metric: BadgeMetric::ChallengesCompleted,
        threshold,
    }
}

/// Badge catalog seeded on startup.
const DEFAULT_BADGES: &[BadgeSeed] = &[
    challenge_badge("challenge_1", "First Blood", "Complete your first challenge", 1),
    challenge_badge("challenge_3", "Warming Up", "Complete 3 challenges", 3),
    challenge_badge("challenge_5", "Regular", "Complete 5 challenges", 5),
    challenge_badge("challenge_10", "Veteran", "Complete 10 challenges", 10),
    challenge_badge("challenge_25", "Marathoner", "Complete 25 challenges", 25),
    BadgeSeed {
        key: "review_1",
        name: "Second Opinion",
        description: "Cast your first peer review vote",
        category: BadgeCategory::ReviewMilestone,
        metric: BadgeMetric::ReviewsCompleted,
        threshold: 1,
    },
    BadgeSeed {
        key: "review_10",
        name: "Reviewer",
        description: "Cast 10 peer review votes",
        category: BadgeCategory::ReviewMilestone,
        metric: BadgeMetric::ReviewsCompleted,
        threshold: 10,
    },
    BadgeSeed {
        key: "review_50",
        name: "Code Critic",
        description: "Cast 50 peer review votes",
        category: BadgeCategory::ReviewMilestone,
        metric: BadgeMetric::ReviewsCompleted,
        threshold: 50,
    },
    BadgeSeed {
        key: "correct_review_5",
        name: "Sharp Eye",
        description: "Cast 5 votes that match the evaluated result",
        category: BadgeCategory::ReviewQuality,
        metric: BadgeMetric::CorrectReviews,
        threshold: 5,
    },
    BadgeSeed {
        key: "correct_review_25",
        name: "Bug Hunter",
        description: "Cast 25 votes that match the evaluated result",
        category: BadgeCategory::ReviewQuality,
        metric: BadgeMetric::CorrectReviews,
        threshold: 25,
    },
];

/// (rank, name, description, min_challenges, min_avg_score, min_badges)
const DEFAULT_TITLES: &[(i32, &str, &str, i32, f64, i32)] = &[
    (1, "Newbie", "Just getting started", 0, 0.0, 0),
    (2, "Pupil", "Completed a first few challenges", 3, 40.0, 1),
    (3, "Specialist", "Consistently solid results", 5, 60.0, 3),
    (4, "Expert", "Strong coder and reviewer", 10, 75.0, 5),
    (5, "Master", "Top of the ladder", 25, 85.0, 8),
];

/// Seed the `badge` catalog. Existing keys are left untouched.
pub async fn seed_badges(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u64;
    for seed in DEFAULT_BADGES {
        let model = badge::ActiveModel {
            key: Set(seed.key.to_string()),
            name: Set(seed.name.to_string()),
            description: Set(seed.description.to_string()),
            icon_key: Set(seed.key.to_string()),
            category: Set(seed.category),
            metric: Set(seed.metric),
            threshold: Set(seed.threshold),
            ..Default::default()
        };

        let result = badge::Entity::insert(model)
            .on_conflict(OnConflict::column(badge::Column::Key).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new badges", inserted);
    }
    Ok(())
}

/// Seed the title ladder. Existing ranks are left untouched.
pub async fn seed_titles(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u64;
    for &(rank, name, description, min_challenges, min_avg_score, min_badges) in DEFAULT_TITLES {
        let model = title::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            rank: Set(rank),
            min_challenges: Set(min_challenges),
            min_avg_score: Set(min_avg_score),
            min_badges: Set(min_badges),
            ..Default::default()
        };

        let result = title::Entity::insert(model)
            .on_conflict(OnConflict::column(title::Column::Rank).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new titles", inserted);
    }
    Ok(())
}

/// Create the configured admin account if it does not exist yet.
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    config: &BootstrapConfig,
) -> anyhow::Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let exists = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }

    let email = config
        .admin_email
        .clone()
        .unwrap_or_else(|| format!("{username}@localhost"));
    let password = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    let now = chrono::Utc::now();

    let admin = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(email),
        password: Set(password),
        role: Set(UserRole::Admin),
        settings: Set(serde_json::json!({})),
        current_title_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = user::Entity::insert(admin)
        .on_conflict(
            OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(n) if n > 0 => info!(%username, "Created bootstrap admin"),
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Run every seeder. Safe to call on each start.
pub async fn seed_all(db: &DatabaseConnection, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    seed_titles(db).await?;
    seed_badges(db).await?;
    seed_bootstrap_admin(db, bootstrap).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn badge_keys_are_unique() {
        let keys: HashSet<_> = DEFAULT_BADGES.iter().map(|b| b.key).collect();
        assert_eq!(keys.len(), DEFAULT_BADGES.len());
    }

    #[test]
    fn challenge_milestones_cover_expected_thresholds() {
        let thresholds: Vec<i32> = DEFAULT_BADGES
            .iter()
            .filter(|b| b.metric == BadgeMetric::ChallengesCompleted)
            .map(|b| b.threshold)
            .collect();
        assert_eq!(thresholds, vec![1, 3, 5, 10, 25]);
    }

    #[test]
    fn title_requirements_grow_with_rank() {
        for pair in DEFAULT_TITLES.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            assert_eq!(higher.0, lower.0 + 1);
            assert!(higher.3 >= lower.3);
            assert!(higher.4 >= lower.4);
            assert!(higher.5 >= lower.5);
        }
    }
}

use chrono::{DateTime, Utc};
use common::{StudentStats, next_title};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::{badge, student_badge, title, user};
use crate::services::title::TitleService;

#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub user: user::Model,
    pub current_title: Option<title::Model>,
    pub stats: StudentStats,
    pub badges: Vec<(badge::Model, DateTime<Utc>)>,
    pub next_title: Option<title::Model>,
}

#[derive(Debug, Clone)]
pub struct Rules {
    pub badges: Vec<badge::Model>,
    pub titles: Vec<title::Model>,
}

pub struct ProfileService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ProfileService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn profile(&self, user_id: i32) -> Result<Option<StudentProfile>, DbErr> {
        let Some(user) = user::Entity::find_by_id(user_id).one(self.conn).await? else {
            return Ok(None);
        };

        let titles = TitleService::new(self.conn);
        let ladder = titles.ladder().await?;
        let stats = titles.student_stats(user_id).await?;

        let current_title = user
            .current_title_id
            .and_then(|id| ladder.iter().find(|t| t.id == id))
            .cloned();
        let requirements: Vec<common::TitleRequirement> =
            ladder.iter().map(common::TitleRequirement::from).collect();
        let next_title = next_title(&requirements, current_title.as_ref().map(|t| t.rank))
            .and_then(|next| ladder.iter().find(|t| t.id == next.id))
            .cloned();

        let badges = student_badge::Entity::find()
            .filter(student_badge::Column::StudentId.eq(user_id))
            .order_by_asc(student_badge::Column::EarnedAt)
            .find_also_related(badge::Entity)
            .all(self.conn)
            .await?
            .into_iter()
            .filter_map(|(earned, badge)| badge.map(|b| (b, earned.earned_at)))
            .collect();

        Ok(Some(StudentProfile {
            user,
            current_title,
            stats,
            badges,
            next_title,
        }))
    }

    /// Full badge catalog and title ladder.
    pub async fn rules(&self) -> Result<Rules, DbErr> {
        let badges = badge::Entity::find()
            .order_by_asc(badge::Column::Category)
            .order_by_asc(badge::Column::Threshold)
            .all(self.conn)
            .await?;
        let titles = TitleService::new(self.conn).ladder().await?;
        Ok(Rules { badges, titles })
    }
}

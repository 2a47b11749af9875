//! 统计计算
//!
//! 全部是对已加载数据的纯函数，每次请求重新计算，不落库也不缓存。

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::attendance::entities::{Attendance, AttendanceStatus};
use crate::models::attendance::responses::{AttendanceSlot, SlotStatus};
use crate::models::dashboard::responses::{
    HalaqaStudentRow, HalaqaSummary, StudentStats, TeacherStats,
};
use crate::models::halaqat::entities::Halaqa;
use crate::models::submissions::entities::{Submission, SubmissionStatus};
use crate::models::tasks::entities::{Task, TaskKind};
use crate::models::tasks::responses::StudentTaskView;
use crate::models::users::responses::UserWithProfile;
use crate::policy::{MAX_SCORE, WEEK_WINDOW_DAYS};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// 分数折算为百分制，保留 1 位小数，没有数据时为 0
fn performance(scores: impl Iterator<Item = f64>) -> f64 {
    mean(scores).map_or(0.0, |avg| round1(100.0 * avg / MAX_SCORE))
}

/// 把任务与本人的提交拼成学生视角的 DTO
pub fn project_student_tasks(
    tasks: Vec<Task>,
    submissions: &[Submission],
    surah_names: &HashMap<i32, String>,
    now: DateTime<Utc>,
) -> Vec<StudentTaskView> {
    let by_task: HashMap<i64, &Submission> = submissions.iter().map(|s| (s.task_id, s)).collect();

    tasks
        .into_iter()
        .map(|task| {
            let surah_name = surah_names.get(&task.surah_id).cloned().unwrap_or_default();
            let submission = by_task.get(&task.id).map(|s| (*s).clone());
            let is_late = submission.is_none() && task.is_past_deadline(now);
            StudentTaskView {
                title: task.title(&surah_name),
                surah_name,
                task,
                submission,
                is_late,
            }
        })
        .collect()
}

/// 未提交或评分不及格
pub fn is_pending(view: &StudentTaskView) -> bool {
    view.submission.as_ref().is_none_or(Submission::is_failed)
}

pub fn pending_tasks_count(views: &[StudentTaskView]) -> i64 {
    views.iter().filter(|v| is_pending(v)).count() as i64
}

/// 按状态把任务分为 (待完成, 已完成, 待评分)
pub fn partition_tasks(
    views: Vec<StudentTaskView>,
) -> (Vec<StudentTaskView>, Vec<StudentTaskView>, Vec<StudentTaskView>) {
    let mut pending = Vec::new();
    let mut completed = Vec::new();
    let mut awaiting = Vec::new();
    for view in views {
        match &view.submission {
            Some(s) if s.is_passed() => completed.push(view),
            Some(s) if s.is_awaiting() => awaiting.push(view),
            _ => pending.push(view),
        }
    }
    (pending, completed, awaiting)
}

/// round(100 * Σscore / (10 * 已评分数))
pub fn accuracy_pct<'a>(submissions: impl Iterator<Item = &'a Submission>) -> i64 {
    let (sum, n) = submissions
        .filter_map(Submission::graded_score)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return 0;
    }
    (100.0 * sum / (MAX_SCORE * n as f64)).round() as i64
}

/// 包含今天在内的最近 7 天
fn week_window(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..WEEK_WINDOW_DAYS)
        .rev()
        .map(move |offset| today - Duration::days(offset))
}

pub fn presence_pct(records: &[Attendance], today: NaiveDate) -> i64 {
    let present = week_window(today)
        .filter(|day| {
            records
                .iter()
                .any(|r| r.date == *day && r.status == AttendanceStatus::Present)
        })
        .count();
    (100.0 * present as f64 / WEEK_WINDOW_DAYS as f64).round() as i64
}

/// 7 个日期槽，今天在最后，无记录的为 unmarked
pub fn weekly_slots(records: &[Attendance], today: NaiveDate) -> Vec<AttendanceSlot> {
    let by_date: HashMap<NaiveDate, AttendanceStatus> =
        records.iter().map(|r| (r.date, r.status)).collect();
    week_window(today)
        .map(|date| AttendanceSlot {
            date,
            status: SlotStatus::from(by_date.get(&date).copied()),
        })
        .collect()
}

/// 学生的全部提交及对应任务，不受加入时间限制
pub type History = [(Task, Submission)];

/// 按任务 id 把提交与任务配对，找不到任务的提交丢弃
pub fn pair_history(tasks: Vec<Task>, submissions: Vec<Submission>) -> Vec<(Task, Submission)> {
    let mut by_id: HashMap<i64, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();
    submissions
        .into_iter()
        .filter_map(|s| by_id.remove(&s.task_id).map(|t| (t, s)))
        .collect()
}

/// 已及格的背诵任务的 ayah 总数
pub fn ayah_count(history: &History) -> i64 {
    history
        .iter()
        .filter(|(task, _)| task.kind == TaskKind::Recitation)
        .filter(|(_, submission)| submission.is_passed())
        .map(|(task, _)| task.ayah_span())
        .sum()
}

/// 最近 7 天内创建的已评分提交的百分制平均分
pub fn weekly_score(history: &History, kind: TaskKind, now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(WEEK_WINDOW_DAYS);
    performance(
        history
            .iter()
            .filter(|(task, _)| task.kind == kind)
            .map(|(_, submission)| submission)
            .filter(|s| s.created_at >= since)
            .filter_map(Submission::graded_score),
    )
}

/// `views` 只决定待完成数，其余成绩统计基于 `history`
pub fn student_stats(
    views: &[StudentTaskView],
    history: &History,
    attendance: &[Attendance],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> StudentStats {
    StudentStats {
        accuracy_pct: accuracy_pct(history.iter().map(|(_, s)| s)),
        presence_pct: presence_pct(attendance, today),
        ayah_count: ayah_count(history),
        pending_tasks_count: pending_tasks_count(views),
        weekly_hifdh_score: weekly_score(history, TaskKind::Recitation, now),
        weekly_review_score: weekly_score(history, TaskKind::Review, now),
    }
}

/// 已评分背诵提交的百分制平均分
fn recitation_performance(tasks: &HashMap<i64, &Task>, submissions: &[Submission]) -> f64 {
    performance(
        submissions
            .iter()
            .filter(|s| {
                tasks
                    .get(&s.task_id)
                    .is_some_and(|t| t.kind == TaskKind::Recitation)
            })
            .filter_map(Submission::graded_score),
    )
}

/// 教师统计，`tasks` 与 `submissions` 限定为该教师所有 halaqa 的数据
pub fn teacher_stats(
    halaqa_count: i64,
    student_count: i64,
    tasks: &[Task],
    submissions: &[Submission],
) -> TeacherStats {
    let task_map: HashMap<i64, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    TeacherStats {
        pending_submissions_count: submissions
            .iter()
            .filter(|s| task_map.contains_key(&s.task_id))
            .filter(|s| s.status == SubmissionStatus::Submitted)
            .count() as i64,
        student_count,
        halaqa_count,
        average_performance: recitation_performance(&task_map, submissions),
    }
}

pub fn halaqa_summary(
    halaqa: Halaqa,
    student_count: i64,
    tasks: &[Task],
    submissions: &[Submission],
) -> HalaqaSummary {
    let own: HashMap<i64, &Task> = tasks
        .iter()
        .filter(|t| t.halaqa_id == halaqa.id)
        .map(|t| (t.id, t))
        .collect();
    let last_of = |kind: TaskKind| {
        own.values()
            .filter(|t| t.kind == kind)
            .map(|t| t.created_at)
            .max()
    };

    HalaqaSummary {
        last_recitation_at: last_of(TaskKind::Recitation),
        last_review_at: last_of(TaskKind::Review),
        average_performance: recitation_performance(&own, submissions),
        student_count,
        halaqa,
    }
}

/// halaqa 详情中每个学生一行
pub fn student_rows(
    students: &[UserWithProfile],
    tasks: &[Task],
    submissions: &[Submission],
    now: DateTime<Utc>,
) -> Vec<HalaqaStudentRow> {
    students
        .iter()
        .map(|entry| {
            let student_id = entry.user.id;
            let joined_at = entry.profile.as_ref().and_then(|p| p.halaqa_joined_at);
            let visible: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.visible_to(student_id, joined_at))
                .collect();
            let own: HashMap<i64, &Submission> = submissions
                .iter()
                .filter(|s| s.student_id == student_id)
                .map(|s| (s.task_id, s))
                .collect();

            let late_count = visible
                .iter()
                .filter(|t| t.is_past_deadline(now) && !own.contains_key(&t.id))
                .count() as i64;
            let average_score = mean(
                visible
                    .iter()
                    .filter_map(|t| own.get(&t.id))
                    .filter_map(|s| s.graded_score()),
            )
            .map(round1);

            HalaqaStudentRow {
                student_id,
                name: entry.user.name().to_string(),
                avatar_url: entry.profile.as_ref().and_then(|p| p.avatar()),
                joined_at,
                average_score,
                late_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    fn task(id: i64, kind: TaskKind, start: i32, end: i32, created: DateTime<Utc>) -> Task {
        Task {
            id,
            halaqa_id: 1,
            created_by: 100,
            kind,
            surah_id: 2,
            start_ayah: start,
            end_ayah: end,
            deadline: None,
            student_id: None,
            created_at: created,
        }
    }

    fn submission(task_id: i64, status: SubmissionStatus, score: Option<f64>) -> Submission {
        Submission {
            id: task_id * 10,
            task_id,
            student_id: 7,
            audio_token: format!("tok-{task_id}"),
            status,
            hifdh: score.map(|s| s / 2.0),
            rules: score.map(|s| s / 2.0),
            score,
            notes: None,
            graded_by: score.map(|_| 100),
            graded_at: score.map(|_| at(10)),
            created_at: at(10),
            updated_at: at(10),
        }
    }

    fn names() -> HashMap<i32, String> {
        HashMap::from([(2, "البقرة".to_string())])
    }

    fn attendance(day: u32, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: day as i64,
            student_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            status,
            created_at: at(day),
        }
    }

    #[test]
    fn test_accuracy_zero_without_grades() {
        let subs = [submission(1, SubmissionStatus::Submitted, None)];
        assert_eq!(accuracy_pct(subs.iter()), 0);
        assert_eq!(accuracy_pct([].iter()), 0);
    }

    #[test]
    fn test_accuracy_rounding() {
        let subs = [
            submission(1, SubmissionStatus::Graded, Some(7.0)),
            submission(2, SubmissionStatus::Graded, Some(8.5)),
            submission(3, SubmissionStatus::Submitted, None),
        ];
        // 100 * 15.5 / 20 = 77.5
        assert_eq!(accuracy_pct(subs.iter()), 78);
    }

    #[test]
    fn test_pending_counts_missing_and_failed() {
        let tasks = vec![
            task(1, TaskKind::Recitation, 1, 5, at(1)),
            task(2, TaskKind::Recitation, 6, 10, at(2)),
            task(3, TaskKind::Review, 1, 20, at(3)),
            task(4, TaskKind::Review, 21, 30, at(4)),
        ];
        let subs = vec![
            submission(1, SubmissionStatus::Graded, Some(7.0)),
            submission(2, SubmissionStatus::Graded, Some(4.0)),
            submission(3, SubmissionStatus::Submitted, None),
        ];
        let views = project_student_tasks(tasks, &subs, &names(), at(10));

        // 任务 2 不及格、任务 4 未提交
        assert_eq!(pending_tasks_count(&views), 2);

        let (pending, completed, awaiting) = partition_tasks(views);
        let ids = |v: &[StudentTaskView]| v.iter().map(|x| x.task.id).collect::<Vec<_>>();
        assert_eq!(ids(&pending), vec![2, 4]);
        assert_eq!(ids(&completed), vec![1]);
        assert_eq!(ids(&awaiting), vec![3]);
    }

    #[test]
    fn test_ayah_count_only_passing_recitation() {
        let tasks = vec![
            task(1, TaskKind::Recitation, 1, 5, at(1)),
            task(2, TaskKind::Recitation, 6, 10, at(2)),
            task(3, TaskKind::Review, 1, 20, at(3)),
        ];
        let subs = vec![
            submission(1, SubmissionStatus::Graded, Some(7.0)),
            submission(2, SubmissionStatus::Graded, Some(4.5)),
            submission(3, SubmissionStatus::Graded, Some(9.0)),
        ];
        let history = pair_history(tasks, subs);
        assert_eq!(ayah_count(&history), 5);
    }

    #[test]
    fn test_stats_cover_tasks_outside_current_view() {
        let earlier = task(1, TaskKind::Recitation, 1, 5, at(1));
        let current = task(2, TaskKind::Recitation, 6, 10, at(8));
        let subs = vec![
            submission(1, SubmissionStatus::Graded, Some(7.0)),
            submission(2, SubmissionStatus::Graded, Some(9.0)),
        ];
        // 换 halaqa 后只看得到任务 2
        let views = project_student_tasks(vec![current.clone()], &subs, &names(), at(10));
        let history = pair_history(vec![earlier, current], subs);

        let stats = student_stats(&views, &history, &[], at(10).date_naive(), at(10));
        assert_eq!(stats.ayah_count, 10);
        assert_eq!(stats.accuracy_pct, 80);
        assert_eq!(stats.pending_tasks_count, 0);
    }

    #[test]
    fn test_projection_title_and_late_flag() {
        let mut late = task(1, TaskKind::Recitation, 1, 5, at(1));
        late.deadline = Some(at(5));
        let mut done = task(2, TaskKind::Recitation, 6, 7, at(1));
        done.deadline = Some(at(5));
        let subs = vec![submission(2, SubmissionStatus::Submitted, None)];

        let views = project_student_tasks(vec![late, done], &subs, &names(), at(10));
        assert_eq!(views[0].title, "البقرة 1-5");
        assert!(views[0].is_late);
        // 已提交的不算逾期
        assert!(!views[1].is_late);
    }

    #[test]
    fn test_weekly_scores_per_kind() {
        let tasks = vec![
            task(1, TaskKind::Recitation, 1, 5, at(1)),
            task(2, TaskKind::Recitation, 6, 10, at(1)),
            task(3, TaskKind::Review, 1, 5, at(1)),
        ];
        let mut old = submission(2, SubmissionStatus::Graded, Some(2.0));
        old.created_at = at(1);
        let subs = vec![
            submission(1, SubmissionStatus::Graded, Some(7.5)),
            old,
            submission(3, SubmissionStatus::Submitted, None),
        ];
        let history = pair_history(tasks, subs);

        // 7 天窗口外的提交不计入
        assert_eq!(weekly_score(&history, TaskKind::Recitation, at(10)), 75.0);
        assert_eq!(weekly_score(&history, TaskKind::Review, at(10)), 0.0);
    }

    #[test]
    fn test_presence_and_slots() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let records = vec![
            attendance(10, AttendanceStatus::Present),
            attendance(9, AttendanceStatus::Late),
            attendance(8, AttendanceStatus::Present),
            attendance(2, AttendanceStatus::Present), // 窗口外
        ];

        assert_eq!(presence_pct(&records, today), 29);

        let slots = weekly_slots(&records, today);
        assert_eq!(slots.len(), 7);
        assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(slots[6].date, today);
        assert_eq!(slots[6].status, SlotStatus::Present);
        assert_eq!(slots[5].status, SlotStatus::Late);
        assert_eq!(slots[0].status, SlotStatus::Unmarked);

        assert_eq!(weekly_slots(&[], today).len(), 7);
    }

    #[test]
    fn test_teacher_stats() {
        let tasks = vec![
            task(1, TaskKind::Recitation, 1, 5, at(1)),
            task(2, TaskKind::Review, 1, 5, at(2)),
            task(3, TaskKind::Recitation, 6, 9, at(3)),
        ];
        let subs = vec![
            submission(1, SubmissionStatus::Graded, Some(8.0)),
            submission(2, SubmissionStatus::Graded, Some(2.0)),
            submission(3, SubmissionStatus::Submitted, None),
        ];
        let stats = teacher_stats(2, 12, &tasks, &subs);
        assert_eq!(stats.pending_submissions_count, 1);
        assert_eq!(stats.halaqa_count, 2);
        assert_eq!(stats.student_count, 12);
        // 只计背诵：8 分 -> 80
        assert_eq!(stats.average_performance, 80.0);

        assert_eq!(teacher_stats(0, 0, &[], &[]), TeacherStats::default());
    }

    #[test]
    fn test_halaqa_summary_last_task_times() {
        let halaqa = Halaqa {
            id: 1,
            name: "الفجر".into(),
            juz_from: Some(1),
            juz_to: Some(3),
            description: None,
            created_at: at(1),
            updated_at: at(1),
        };
        let mut foreign = task(9, TaskKind::Review, 1, 5, at(9));
        foreign.halaqa_id = 2;
        let tasks = vec![
            task(1, TaskKind::Recitation, 1, 5, at(3)),
            task(2, TaskKind::Recitation, 6, 9, at(5)),
            foreign,
        ];
        let summary = halaqa_summary(halaqa, 4, &tasks, &[]);
        assert_eq!(summary.last_recitation_at, Some(at(5)));
        assert_eq!(summary.last_review_at, None);
        assert_eq!(summary.average_performance, 0.0);
        assert_eq!(summary.student_count, 4);
    }

    #[test]
    fn test_student_rows_respect_enrollment() {
        use crate::models::users::entities::{
            Profile, TeacherStatus, User, UserRole, UserStatus,
        };

        let student = UserWithProfile {
            user: User {
                id: 7,
                username: "maryam".into(),
                email: "maryam@example.org".into(),
                password_hash: String::new(),
                role: UserRole::Student,
                status: UserStatus::Active,
                display_name: Some("Maryam".into()),
                last_login: None,
                created_at: at(1),
                updated_at: at(1),
            },
            profile: Some(Profile {
                user_id: 7,
                role: UserRole::Student,
                halaqa_id: Some(1),
                halaqa_joined_at: Some(at(3)),
                teacher_status: TeacherStatus::Approved,
                gender: None,
                birth_date: None,
                guardian_phone: None,
                institution: None,
                bio: None,
                avatar_url: None,
                created_at: at(1),
                updated_at: at(1),
            }),
        };

        let mut before_join = task(1, TaskKind::Recitation, 1, 5, at(2));
        before_join.deadline = Some(at(4));
        let mut overdue = task(2, TaskKind::Recitation, 6, 9, at(4));
        overdue.deadline = Some(at(6));
        let graded = task(3, TaskKind::Review, 1, 9, at(5));
        let subs = vec![submission(3, SubmissionStatus::Graded, Some(6.5))];

        let rows = student_rows(&[student], &[before_join, overdue, graded], &subs, at(10));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Maryam");
        // 加入前的任务不计逾期
        assert_eq!(rows[0].late_count, 1);
        assert_eq!(rows[0].average_score, Some(6.5));
    }
}

//! Notice texts.  Most come in a few variants so the bot doesn't sound like a broken record.

use rand::seq::SliceRandom;
use serenity::all::{Mentionable, UserId};

pub const AI_APOLOGY: &str = "지금 AI 응답을 받을 수 없어요. 한도가 찼거나 서버가 바쁜 것 같아요. 잠시 뒤에 다시 시도해 주세요.";

fn pick(variants: &[String]) -> String {
    variants
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

/// `95` -> `1시간 35분`.  Non-positive values read as `0분`.
pub fn format_minutes(minutes: i64) -> String {
    if minutes <= 0 {
        return "0분".to_owned();
    }
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}분"),
        (h, 0) => format!("{h}시간"),
        (h, m) => format!("{h}시간 {m}분"),
    }
}

fn snarky_prefix() -> String {
    pick(&[
        "또 왔네요, ".to_owned(),
        "아직도 버티는 중이네요, ".to_owned(),
        "에휴 참… ".to_owned(),
        "공부하는 척은 아주 열심히네요, ".to_owned(),
        "참나… ".to_owned(),
    ])
}

pub fn rest_entry(user_id: UserId, visits: u32, rest_total_minutes: i64) -> String {
    let who = user_id.mention();
    let stats = format!(
        " (오늘 쉼터 {visits}번째, 지금까지 {} 쉼)",
        format_minutes(rest_total_minutes)
    );
    let core = pick(&[
        format!("{who} 또 쉬러 왔네요? 이번엔 얼마나 누워있을 건데요."),
        format!("{who} 쉬러 오셨군요. 금방 돌아가세요."),
        format!("{who} 쉬는 거 15분 넘기면 공부방으로 강제 이동이에요."),
    ]);
    format!("{}{}{}", snarky_prefix(), core, stats)
}

pub fn rest_departure(user_id: UserId, visit_minutes: i64, rest_total_minutes: i64) -> String {
    format!(
        "{} 쉼터에서 {} 쉬고 나감. 오늘 쉰 시간 총 {}.",
        user_id.mention(),
        format_minutes(visit_minutes),
        format_minutes(rest_total_minutes)
    )
}

pub fn study_departure(user_id: UserId, visit_minutes: i64, today_minutes: i64) -> String {
    format!(
        "{} 이번에 {} 공부하고 나감. 오늘 순공 총 {}.",
        user_id.mention(),
        format_minutes(visit_minutes),
        format_minutes(today_minutes)
    )
}

pub fn freedom_earned(user_id: UserId) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} 할당량은 채웠으니 봐준다. 놀다 가."),
        format!("{who} 해방 입장. 내일도 이만큼은 해라."),
        format!("{who} 그래, 오늘은 쉴 자격 있다. ㅎ"),
    ])
}

pub fn freedom_unearned(user_id: UserId) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} ㅋㅋㅋ 공부도 다 안 했으면서 벌써 놀려고? 음소거다."),
        format!("{who} 여긴 할당량 채운 사람만 오는 데다. 공부부터 하고 와."),
        format!("{who} 넌 아직 해방 올 자격 없어. 입 다물고 공부방 가."),
    ])
}

pub fn pledge_rejected(user_id: UserId) -> String {
    format!(
        "{} 다짐방은 목표 시간을 먼저 선언한 사람만 쓰는 곳이에요. 다짐 채널에 `2시간`처럼 적고 오세요.",
        user_id.mention()
    )
}

pub fn pledge_remaining(user_id: UserId, remaining_minutes: i64) -> String {
    format!(
        "{} 다짐한 시간까지 {} 남았어요. 시작.",
        user_id.mention(),
        format_minutes(remaining_minutes)
    )
}

pub fn pledge_priority(user_id: UserId, remaining_minutes: i64) -> String {
    format!(
        "{} 다짐이 진행 중이라 이 방 시간보다 다짐이 먼저예요. 다짐까지 {} 남음.",
        user_id.mention(),
        format_minutes(remaining_minutes)
    )
}

pub fn pledge_accepted(user_id: UserId, target_minutes: u32) -> String {
    format!(
        "{} {} 다짐 접수. 다짐방으로 보낸다. 채우기 전엔 못 나온다고 생각해.",
        user_id.mention(),
        format_minutes(target_minutes as i64)
    )
}

pub fn pledge_needs_voice(user_id: UserId) -> String {
    format!(
        "{} 음성 채널에 먼저 들어와서 다짐하세요.",
        user_id.mention()
    )
}

pub fn pledge_already_active(user_id: UserId, remaining_minutes: i64) -> String {
    format!(
        "{} 이미 다짐한 게 있어요. {} 남았으니 그거부터 끝내요.",
        user_id.mention(),
        format_minutes(remaining_minutes)
    )
}

pub fn pledge_fulfilled(user_id: UserId, target_minutes: u32) -> String {
    format!(
        "{} {} 다짐 달성. 말한 건 지켰네?",
        user_id.mention(),
        format_minutes(target_minutes as i64)
    )
}

pub fn study_entry_finite(user_id: UserId, used_minutes: i64, remaining_minutes: i64) -> String {
    let used = format_minutes(used_minutes);
    let remain = format_minutes(remaining_minutes);
    let core = pick(&[
        format!("지금까지 {used} 공부했네. 앞으로 {remain} 남았는데 고작 그거 가지고 되겠어?"),
        format!("누적 {used}, 남은 거 {remain}. 그거로 뭘 해 ㅋ"),
        format!("앞으로 {remain} 남았어. 지금까지 {used}밖에 안 했네. 더 해."),
    ]);
    format!("{}{} {}", snarky_prefix(), user_id.mention(), core)
}

pub fn study_entry_time_up() -> String {
    pick(&[
        " 근데 남은 시간이 0분이네요? 곧 끌려나가도 놀라지 말아요.".to_owned(),
        " 시간 다 됐다. 곧 이동시킨다.".to_owned(),
        " 남은 거 0분. 빨리 마무리해.".to_owned(),
    ])
}

pub fn study_entry_unlimited_mute(user_id: UserId) -> String {
    let core = pick(&[
        "와.... 여기까지 올 정도면 어지간히 놀았나 보네요? 이제 진짜 좀 하겠다는 거죠?".to_owned(),
        "시간무제한 방까지 왔네 ㅋㅋ 진짜 하려는 거 맞지?".to_owned(),
        "무제한 방이니까 이제 제대로 해라.".to_owned(),
    ]);
    format!("{}{} {}", snarky_prefix(), user_id.mention(), core)
}

pub fn study_entry_long(user_id: UserId, used_minutes: i64) -> String {
    let used = format_minutes(used_minutes);
    let core = pick(&[
        format!("여긴 사실상 무제한인데, 그 와중에 지금까지 {used}밖에 안 했네요?"),
        format!("무제한 방인데 {used}밖에 안 했어? ㅋ 더 해."),
        format!("지금까지 {used}. 여기선 더 하라는 거다."),
    ]);
    format!("{}{} {}", snarky_prefix(), user_id.mention(), core)
}

pub fn quota_done(user_id: UserId) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} 할당량 채웠다고? ㅎ 이제 해방 가서 놀아."),
        format!("{who} 시간 다 됐다. 공부 끝. 해방 가."),
        format!("{who} ㅋ 그래서 진짜 다 한 거 맞지? 해방 가."),
    ])
}

pub fn quota_may_leave(user_id: UserId) -> String {
    format!(
        "{} 5시간 채웠다. 이제 나가도 된다. 더 있겠다면 말리진 않음.",
        user_id.mention()
    )
}

pub fn ai_credit_charged(user_id: UserId) -> String {
    format!("{} AI 이용횟수 1회 충전되었어요.", user_id.mention())
}

pub fn rest_warning(user_id: UserId, minutes: u32) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} 지금 휴식 {minutes}분째인데 언제까지 쉴려고…? 15분 넘기면 공부방으로 끌고 간다."),
        format!("{who} {minutes}분 됐다. 더 쉬면 긴 공부방으로 보낸다."),
        format!("{who} {minutes}분째 쉬는 중이네. 이게 공부야?"),
    ])
}

pub fn rest_forced_move(user_id: UserId) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} 15분 넘겼다. 이제 긴 공부방 가. 강제다."),
        format!("{who} 쉬는 거 끝. 공부하러 가. 더 오래 해."),
        format!("{who} 쉬기만 하니까 긴 공부방으로 보낸다. 제대로 해라."),
    ])
}

pub fn chat_scold(user_id: UserId) -> String {
    let who = user_id.mention();
    pick(&[
        format!("{who} 야 공부도 안 한 사람이 집중 안 해? 채팅 그만 해."),
        format!("{who} 공부 할당량 안 채웠으면 채팅부터 줄여. 집중해."),
        format!("{who} 할당량 채우고 와. 채팅 그만."),
    ])
}

pub fn study_time_reply(user_id: UserId, study_minutes: i64) -> String {
    let who = user_id.mention();
    let used = format_minutes(study_minutes);
    pick(&[
        format!("{who} {used} 공부했는데, 그거 고작 공부했다고 지금 물어본 거야?"),
        format!("{who} 오늘 {used}. 원래 공부 잘하는 애들은 시간 안 물어보던데...."),
        format!("{who} 지금까지 {used}. 시간 세는 거 말고 공부나 더 해."),
    ])
}

pub fn ai_out_of_credit(user_id: UserId, prefix: &str) -> String {
    format!(
        "{} AI 사용 기회가 없어요. 공부 1시간당 1회 충전돼요. `{}순공시간`으로 오늘 순공 확인해 보세요.",
        user_id.mention(),
        prefix
    )
}

pub fn ai_credits_left(user_id: UserId, left: i64) -> String {
    format!("{} 기회 **{}번** 남았어요.", user_id.mention(), left)
}

pub fn ai_credit_summary(user_id: UserId, remaining: i64, hours: i64, used: i64) -> String {
    format!(
        "{} 남은 AI 사용 기회 **{remaining}번**이에요. (오늘 순공 {hours}시간 → +{hours}회, 사용 {used}회)",
        user_id.mention()
    )
}

pub fn ai_credits_granted(user_id: UserId, count: u32, remaining: i64) -> String {
    format!(
        "{} AI 사용 기회 {count}회 충전 완료. 지금 **{remaining}번** 남았어요.",
        user_id.mention()
    )
}

pub fn ai_grant_usage(prefix: &str) -> String {
    format!("사용법: `{prefix}AI충전 @사용자 횟수` (횟수는 1 이상)")
}

pub const ADMIN_ONLY: &str = "이 명령은 관리자만 쓸 수 있어요.";
pub const AI_TEST_WRONG_CHANNEL: &str = "이 명령은 AI 채널에서만 사용할 수 있어요.";
pub const AI_TEST_STARTED: &str = "Gemini 호출 중...";
pub const AI_TEST_PROMPT: &str = "한 문장으로 인사만 해줘.";
pub const AI_TEST_FAILED: &str =
    "실패: 봇이 돌아가는 콘솔에 오류가 찍혀 있을 거예요. 확인해 주세요.";

pub fn ai_test_succeeded(reply: &str) -> String {
    let reply: String = reply.chars().take(500).collect();
    format!("성공: {reply}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes() {
        assert_eq!(format_minutes(-3), "0분");
        assert_eq!(format_minutes(0), "0분");
        assert_eq!(format_minutes(45), "45분");
        assert_eq!(format_minutes(120), "2시간");
        assert_eq!(format_minutes(95), "1시간 35분");
    }

    #[test]
    fn notices_mention_the_member() {
        let user_id = UserId::new(77);
        assert!(quota_done(user_id).contains("<@77>"));
        assert!(rest_entry(user_id, 2, 12).contains("2번째"));
        assert!(study_departure(user_id, 30, 95).contains("1시간 35분"));
    }

    #[test]
    fn ai_test_reply_is_truncated() {
        let long = "가".repeat(800);
        assert_eq!(ai_test_succeeded(&long).chars().count(), "성공: ".chars().count() + 500);
    }
}

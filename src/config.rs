use crate::{
    gemini::GeminiSettings,
    rooms::{RoomKind, RoomTable},
    study::Policy,
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, GuildId, RoleId, UserId};
use std::{num::NonZeroU64, path::PathBuf, time::Duration};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/studybot/config.toml";
const CONFIG_PATH_ENV: &str = "STUDYBOT_CONFIG";

const DEFAULT_PERSONA: &str = "너는 공부하는 사람한테 츤데레처럼 말하면서 조언하는 AI다.

[반드시 지켜야 할 것]
1. 핵심을 숨기지 말고 한눈에 보이게 써라. 번호나 불릿을 써서 핵심만 훑어봐도 읽히게 해 줘.
2. 공부 조언은 꼼꼼하게 하되 (1) 지금 할 행동 (2) 그 이유 (3) 나중에 점검할 것을 구분해서 써라.
3. 먼저 살짝 꼽주듯이 한마디 하고, 그 다음 진심으로 조언하는 톤으로 이어가라.
4. 말투는 통통 튀게. 존댓말과 반말을 섞어도 된다.
5. 조언이 들어가면 5~10문장 정도. 한국어.";

/// Bot configuration
///
/// Ids are `NonZeroU64` so a zero (usually a forgotten placeholder) is rejected at load.
#[derive(serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub rooms: Rooms,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub ai: Ai,
    #[serde(default)]
    pub health: Health,
    /// Filled from the environment, never from the file.
    #[serde(skip)]
    pub secrets: Secrets,
}

#[derive(serde::Deserialize)]
pub struct General {
    pub guild_id: NonZeroU64,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    pub admin_id: NonZeroU64,
    pub notice_channel_id: NonZeroU64,
    pub ai_channel_id: NonZeroU64,
    pub pledge_channel_id: NonZeroU64,
    #[serde(default = "default_chat_limit")]
    pub chat_limit: u32,
    #[serde(default)]
    pub chat_restricted_role_id: Option<NonZeroU64>,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Shared by every bot process that should deduplicate against each other.
    #[serde(default)]
    pub dedup_dir: Option<PathBuf>,
}

#[derive(serde::Deserialize)]
pub struct Rooms {
    pub freedom: NonZeroU64,
    pub rest: NonZeroU64,
    /// Where members overstaying the rest room are sent.
    pub rest_overflow: NonZeroU64,
    pub pledge_voice: NonZeroU64,
    #[serde(default)]
    pub study: Vec<StudyRoom>,
}

#[derive(serde::Deserialize)]
pub struct StudyRoom {
    pub channel_id: NonZeroU64,
    /// Set for timed rooms.  Rooms without it are unlimited.
    #[serde(default)]
    pub limit_minutes: Option<u32>,
    #[serde(default)]
    pub quota_minutes: Option<u32>,
    #[serde(default)]
    pub stay_after_quota: bool,
}

#[derive(serde::Deserialize)]
#[serde(default)]
pub struct Timing {
    pub quota_poll_seconds: u64,
    pub rest_poll_seconds: u64,
    pub rest_warning_minutes: Vec<u32>,
    pub rest_force_move_minutes: u32,
}

#[derive(serde::Deserialize)]
#[serde(default)]
pub struct Ai {
    pub base_url: String,
    pub models: Vec<String>,
    pub persona: String,
    pub max_input_chars: usize,
    pub max_output_chars: usize,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
}

#[derive(serde::Deserialize)]
#[serde(default)]
pub struct Health {
    pub port: u16,
    pub self_ping_seconds: u64,
}

#[derive(Default)]
pub struct Secrets {
    pub discord_token: String,
    pub gemini_api_key: Option<String>,
    /// External base URL the service is reachable at.  Enables the self-ping loop.
    pub self_ping_url: Option<String>,
}

fn default_command_prefix() -> String {
    "!".to_owned()
}

fn default_chat_limit() -> u32 {
    5
}

fn default_utc_offset_hours() -> i32 {
    9
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            quota_poll_seconds: 30,
            rest_poll_seconds: 60,
            rest_warning_minutes: vec![5, 10],
            rest_force_move_minutes: 15,
        }
    }
}

impl Default for Ai {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            models: [
                "gemini-flash-latest",
                "gemini-1.5-flash-latest",
                "gemini-1.5-flash",
                "gemini-1.5-flash-8b",
                "gemini-2.5-flash",
                "gemini-2.5-flash-lite",
            ]
            .map(str::to_owned)
            .to_vec(),
            persona: DEFAULT_PERSONA.to_owned(),
            max_input_chars: 4000,
            max_output_chars: 2000,
            max_output_tokens: 1500,
            timeout_seconds: 25,
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self {
            port: 8000,
            self_ping_seconds: 180,
        }
    }
}

impl Secrets {
    fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or(anyhow!(
                "DISCORD_TOKEN is not set.  Put it in the environment or a `.env` file."
            ))?;

        let optional = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            discord_token,
            gemini_api_key: optional("GEMINI_API_KEY"),
            self_ping_url: optional("SELF_PING_URL"),
        })
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        // A missing `.env` is fine; the variables may come from the real environment.
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut config = Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;
        config.secrets = Secrets::from_env()?;

        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;

        for room in &config.rooms.study {
            if room.limit_minutes.is_some()
                && (room.quota_minutes.is_some() || room.stay_after_quota)
            {
                return Err(anyhow!(
                    "study room {} sets `limit_minutes` together with unlimited-room options",
                    room.channel_id
                ));
            }
        }
        if !(-23..=23).contains(&config.general.utc_offset_hours) {
            return Err(anyhow!(
                "utc_offset_hours must be between -23 and 23, got {}",
                config.general.utc_offset_hours
            ));
        }
        if config.timing.quota_poll_seconds == 0 || config.timing.rest_poll_seconds == 0 {
            return Err(anyhow!("poll intervals must be at least one second"));
        }

        Ok(config)
    }

    pub fn guild_id(&self) -> GuildId {
        GuildId::new(self.general.guild_id.get())
    }

    pub fn admin_id(&self) -> UserId {
        UserId::new(self.general.admin_id.get())
    }

    pub fn notice_channel(&self) -> ChannelId {
        ChannelId::new(self.general.notice_channel_id.get())
    }

    pub fn ai_channel(&self) -> ChannelId {
        ChannelId::new(self.general.ai_channel_id.get())
    }

    pub fn pledge_channel(&self) -> ChannelId {
        ChannelId::new(self.general.pledge_channel_id.get())
    }

    pub fn room_table(&self) -> RoomTable {
        let rooms = &self.rooms;
        let channel = |id: NonZeroU64| ChannelId::new(id.get());

        let study = rooms.study.iter().map(|room| {
            let kind = match room.limit_minutes {
                Some(limit_minutes) => RoomKind::TimedStudy { limit_minutes },
                None => RoomKind::UnlimitedStudy {
                    quota_minutes: room.quota_minutes,
                    stay_after_quota: room.stay_after_quota,
                },
            };
            (channel(room.channel_id), kind)
        });

        RoomTable::new(
            channel(rooms.freedom),
            channel(rooms.rest),
            channel(rooms.rest_overflow),
            channel(rooms.pledge_voice),
            study,
        )
    }

    pub fn policy(&self) -> Policy {
        let mut rest_warning_minutes = self.timing.rest_warning_minutes.clone();
        rest_warning_minutes.sort_unstable();
        rest_warning_minutes.dedup();

        Policy {
            rooms: self.room_table(),
            utc_offset_hours: self.general.utc_offset_hours,
            chat_limit: self.general.chat_limit,
            chat_restricted_role: self
                .general
                .chat_restricted_role_id
                .map(|id| RoleId::new(id.get())),
            rest_warning_minutes,
            rest_force_move_minutes: self.timing.rest_force_move_minutes,
        }
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            base_url: self.ai.base_url.clone(),
            models: self.ai.models.clone(),
            persona: self.ai.persona.clone(),
            max_input_chars: self.ai.max_input_chars,
            max_output_chars: self.ai.max_output_chars,
            max_output_tokens: self.ai.max_output_tokens,
            timeout: Duration::from_secs(self.ai.timeout_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [general]
        guild_id = 1
        admin_id = 2
        notice_channel_id = 3
        ai_channel_id = 4
        pledge_channel_id = 5

        [rooms]
        freedom = 10
        rest = 11
        rest_overflow = 21
        pledge_voice = 12

        [[rooms.study]]
        channel_id = 20
        limit_minutes = 60

        [[rooms.study]]
        channel_id = 21
        limit_minutes = 180

        [[rooms.study]]
        channel_id = 23
        quota_minutes = 300
        stay_after_quota = true

        [[rooms.study]]
        channel_id = 24
    "#;

    #[test]
    fn defaults_fill_optional_sections() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.general.command_prefix, "!");
        assert_eq!(config.general.chat_limit, 5);
        assert_eq!(config.general.utc_offset_hours, 9);
        assert_eq!(config.timing.quota_poll_seconds, 30);
        assert_eq!(config.health.port, 8000);
        assert_eq!(config.ai.timeout_seconds, 25);
        assert!(config.general.chat_restricted_role_id.is_none());
    }

    #[test]
    fn room_table_follows_study_entries() {
        let rooms = Config::parse(MINIMAL).unwrap().room_table();
        let kind = |id: u64| rooms.classify(Some(ChannelId::new(id)));

        assert_eq!(kind(20), RoomKind::TimedStudy { limit_minutes: 60 });
        assert_eq!(
            kind(23),
            RoomKind::UnlimitedStudy {
                quota_minutes: Some(300),
                stay_after_quota: true,
            }
        );
        assert_eq!(
            kind(24),
            RoomKind::UnlimitedStudy {
                quota_minutes: None,
                stay_after_quota: false,
            }
        );
        assert_eq!(kind(12), RoomKind::PledgeVoice);
        assert_eq!(kind(99), RoomKind::Other);
        assert_eq!(rooms.rest_overflow(), ChannelId::new(21));
    }

    #[test]
    fn zero_ids_are_rejected() {
        let broken = MINIMAL.replace("guild_id = 1", "guild_id = 0");
        assert!(Config::parse(&broken).is_err());

        let broken = MINIMAL.replace("freedom = 10", "freedom = 0");
        assert!(Config::parse(&broken).is_err());
    }

    #[test]
    fn offset_must_be_within_a_day() {
        let broken = MINIMAL.replace(
            "pledge_channel_id = 5",
            "pledge_channel_id = 5\n        utc_offset_hours = 30",
        );
        assert!(Config::parse(&broken).is_err());
    }

    #[test]
    fn timed_rooms_cannot_carry_unlimited_options() {
        let broken = MINIMAL.replace(
            "limit_minutes = 60",
            "limit_minutes = 60\n        stay_after_quota = true",
        );
        assert!(Config::parse(&broken).is_err());
    }

    #[test]
    fn warning_thresholds_are_sorted() {
        let config = MINIMAL.to_owned() + "\n[timing]\nrest_warning_minutes = [10, 5, 10]\n";
        let policy = Config::parse(&config).unwrap().policy();
        assert_eq!(policy.rest_warning_minutes, vec![5, 10]);
        assert_eq!(policy.rest_force_move_minutes, 15);
    }
}

use poise::serenity_prelude::{GuildId, Http, Permissions};
use tracing::{error, info, warn};

/// A single permission with its status
#[derive(Debug, Clone)]
pub struct PermissionStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub has_permission: bool,
}

/// Everything verification does in a guild needs one of these
pub fn get_required_permissions() -> Vec<(&'static str, &'static str, Permissions)> {
    vec![
        ("VIEW_CHANNEL", "See the rules and review channels", Permissions::VIEW_CHANNEL),
        ("SEND_MESSAGES", "Post verification requests for review", Permissions::SEND_MESSAGES),
        ("MANAGE_ROLES", "Create and assign verification roles", Permissions::MANAGE_ROLES),
        ("MANAGE_NICKNAMES", "Set member nicknames after verification", Permissions::MANAGE_NICKNAMES),
        ("KICK_MEMBERS", "Remove members whose verification was denied", Permissions::KICK_MEMBERS),
        ("CREATE_INSTANT_INVITE", "Invite denied members back to the rules channel", Permissions::CREATE_INSTANT_INVITE),
    ]
}

/// Compare what the bot has against what it needs
pub fn evaluate_permissions(bot_permissions: Permissions) -> Vec<PermissionStatus> {
    get_required_permissions()
        .into_iter()
        .map(|(name, description, permission)| PermissionStatus {
            name,
            description,
            has_permission: bot_permissions.administrator() || bot_permissions.contains(permission),
        })
        .collect()
}

/// Result of a permission check for a single guild
#[derive(Debug)]
pub struct GuildPermissionCheck {
    pub guild_id: GuildId,
    pub guild_name: String,
    pub permission_statuses: Vec<PermissionStatus>,
    pub bot_role_name: Option<String>,
    pub bot_role_position: Option<u16>,
    /// Verification roles at or above the bot, which it cannot assign
    pub roles_above_bot: Vec<(String, u16)>,
}

impl GuildPermissionCheck {
    pub fn has_all_permissions(&self) -> bool {
        self.permission_statuses.iter().all(|s| s.has_permission)
    }

    pub fn is_ok(&self) -> bool {
        self.has_all_permissions() && self.roles_above_bot.is_empty()
    }
}

/// Check bot permissions and role position for a specific guild
pub async fn check_guild_permissions(
    http: &Http,
    guild_id: GuildId,
    managed_role_names: &[String],
) -> Result<GuildPermissionCheck, String> {
    let guild = guild_id
        .to_partial_guild(http)
        .await
        .map_err(|e| format!("Failed to fetch guild {}: {}", guild_id, e))?;

    let bot_user = http
        .get_current_user()
        .await
        .map_err(|e| format!("Failed to get bot user: {}", e))?;

    let bot_member = guild
        .member(http, bot_user.id)
        .await
        .map_err(|e| format!("Failed to get bot member in guild {}: {}", guild_id, e))?;

    #[allow(deprecated)]
    let bot_permissions = guild.member_permissions(&bot_member);

    let bot_role = bot_member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .max_by_key(|role| role.position);
    let bot_role_position = bot_role.map(|r| r.position);

    let mut roles_above_bot: Vec<(String, u16)> = guild
        .roles
        .values()
        .filter(|role| managed_role_names.contains(&role.name))
        .filter(|role| bot_role_position.map_or(true, |pos| role.position >= pos))
        .map(|role| (role.name.clone(), role.position))
        .collect();
    roles_above_bot.sort_by(|a, b| b.1.cmp(&a.1));

    Ok(GuildPermissionCheck {
        guild_id,
        guild_name: guild.name.clone(),
        permission_statuses: evaluate_permissions(bot_permissions),
        bot_role_name: bot_role.map(|r| r.name.clone()),
        bot_role_position,
        roles_above_bot,
    })
}

/// Log permission check results with appropriate log levels
pub fn log_permission_check_results(results: &[GuildPermissionCheck]) {
    info!("========================================");
    info!("       BOT PERMISSION CHECK");
    info!("========================================");

    for check in results {
        info!("Guild: '{}' (ID: {})", check.guild_name, check.guild_id);

        match (&check.bot_role_name, check.bot_role_position) {
            (Some(name), Some(pos)) => info!("Bot's highest role: '{}' (position {})", name, pos),
            _ => warn!("Bot has no roles assigned!"),
        }

        info!("Server Permissions:");
        for status in &check.permission_statuses {
            if status.has_permission {
                info!("  [YES] {:<22} - {}", status.name, status.description);
            } else {
                error!("  [NO]  {:<22} - {}", status.name, status.description);
            }
        }

        if !check.roles_above_bot.is_empty() {
            warn!("  Verification roles the bot CANNOT assign (at or above bot's position):");
            for (role_name, pos) in &check.roles_above_bot {
                warn!("    - '{}' (position {})", role_name, pos);
            }
            warn!("  Fix: Go to Discord Server Settings > Roles > drag bot's role higher");
        }

        if check.is_ok() {
            info!("Status: ALL CHECKS PASSED");
        } else {
            error!("Status: ISSUES DETECTED - Some verification steps may fail!");
        }
        info!("========================================");
    }
}

/// Run a full permission check and log results.
/// Returns true if every guild passed.
pub async fn run_startup_permission_check(
    http: &Http,
    guild_ids: &[GuildId],
    managed_role_names: &[String],
) -> bool {
    let mut results = Vec::new();
    for guild_id in guild_ids {
        match check_guild_permissions(http, *guild_id, managed_role_names).await {
            Ok(check) => results.push(check),
            Err(e) => error!("Failed to check permissions for guild {}: {}", guild_id, e),
        }
    }

    log_permission_check_results(&results);
    results.iter().all(|r| r.is_ok())
}

//! Discord slash commands — `/ping`, `/model`, `/talk`, `/whisper`, `/stop`,
//! `/dm`.
//!
//! Registration happens in `ready()`; interactions are dispatched from
//! `interaction_create` in the event handler.

use std::sync::Arc;
use std::time::Instant;

use serenity::builder::{
    CreateCommand, CreateCommandOption, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse,
};
use serenity::model::application::{Command, CommandInteraction, CommandOptionType};
use serenity::model::id::RoleId;
use serenity::prelude::Context;
use tracing::{info, warn};

use sage_agent::{append_user_context, relay_exchange, ProviderError, UserInfo};
use sage_sessions::SessionScope;

use crate::context::BotContext;
use crate::handler::{disarm_stop_button, emoji_catalog, fill_guild_details, render_parts};
use crate::state::StopRecord;
use crate::typing::TypingGuard;
use crate::{actions, buttons, embed, send};

/// Register global slash commands. Call from `ready()`.
pub async fn register_commands(ctx: &Context) {
    let commands = vec![
        CreateCommand::new("ping").description("Health and latency check"),
        CreateCommand::new("model")
            .description("Show or switch the backend model")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "name",
                    "Model name (e.g. llama3.1)",
                )
                .required(false),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Boolean,
                    "reset",
                    "Also clear all conversation history",
                )
                .required(false),
            ),
        CreateCommand::new("talk")
            .description("Invite Sage into a text channel")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "channel",
                    "Channel where Sage will reply",
                )
                .required(false),
            ),
        CreateCommand::new("whisper")
            .description("Private exchange with Sage (only you see it)")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "prompt",
                    "What you want to tell Sage",
                )
                .required(true),
            ),
        CreateCommand::new("stop")
            .description("Withdraw Sage from a channel")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::Channel,
                    "channel",
                    "Channel where Sage should stop",
                )
                .required(false),
            ),
        CreateCommand::new("dm").description("Start a DM conversation with Sage"),
    ];

    match Command::set_global_commands(&ctx.http, commands).await {
        Ok(cmds) => info!(count = cmds.len(), "registered global slash commands"),
        Err(e) => warn!(error = %e, "failed to register global slash commands"),
    }
}

/// Dispatch a slash command interaction to the appropriate handler.
pub async fn handle_interaction(app: &Arc<BotContext>, ctx: &Context, command: &CommandInteraction) {
    let result = match command.data.name.as_str() {
        "ping" => handle_ping(app, ctx, command).await,
        "model" => handle_model(app, ctx, command).await,
        "talk" => handle_talk(app, ctx, command).await,
        "whisper" => handle_whisper(app, ctx, command).await,
        "stop" => handle_stop(app, ctx, command).await,
        "dm" => handle_dm(app, ctx, command).await,
        _ => {
            respond_ephemeral(ctx, command, "Unknown command.").await;
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!(command = %command.data.name, error = %e, "slash command error");
    }
}

/// `/ping` — round-trip latency, uptime and the active model.
async fn handle_ping(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let started = Instant::now();
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;
    let api_latency_ms = started.elapsed().as_millis();

    let monitoring = CreateEmbed::new()
        .title("Monitoring")
        .colour(embed::JOIN_COLOR)
        .field("Latency", format!("API: {} ms", api_latency_ms), true)
        .field(
            "Process",
            format!(
                "Uptime: {}",
                format_duration(app.runtime.started.elapsed().as_secs()),
            ),
            true,
        )
        .field("Backend", format!("Model: {}", app.store.active_model()), true);

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(monitoring))
        .await?;
    Ok(())
}

/// `/model [name] [reset]` — show or switch the active model.
async fn handle_model(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let name = command
        .data
        .options
        .iter()
        .find(|o| o.name == "name")
        .and_then(|o| o.value.as_str());
    let reset = command
        .data
        .options
        .iter()
        .find(|o| o.name == "reset")
        .and_then(|o| o.value.as_bool())
        .unwrap_or(false);

    match name {
        None => {
            let msg = format!("Active model: {}", app.store.active_model());
            respond_ephemeral(ctx, command, &msg).await;
        }
        Some(name) => {
            let name = name.trim();
            let previous = app.store.set_active_model(name);
            if reset {
                app.store.clear_all();
            }
            info!(previous = %previous, new = %name, reset, "model switched via /model");
            let msg = format!(
                "Active model: {}{}",
                name,
                if reset { " (history cleared)" } else { "" }
            );
            respond_ephemeral(ctx, command, &msg).await;
        }
    }
    Ok(())
}

/// `/talk [channel]` — introduce Sage into a guild channel and start relaying.
async fn handle_talk(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let Some(guild_id) = command.guild_id else {
        respond_ephemeral(ctx, command, "Pick a text channel in a server.").await;
        return Ok(());
    };
    let channel_id = command
        .data
        .options
        .iter()
        .find(|o| o.name == "channel")
        .and_then(|o| o.value.as_channel_id())
        .unwrap_or(command.channel_id);

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let key = SessionScope::Channel {
        guild_id: guild_id.get(),
        channel_id: channel_id.get(),
    }
    .key();
    let info = user_info_for_command(ctx, command);
    let catalog = emoji_catalog(ctx, Some(guild_id));
    let starter = append_user_context(
        &format!(
            "Introduce yourself in ONE sentence as Sage, a friendly and \
             knowledgeable guide; say you are here to discuss, explain and \
             help. User: {}",
            info.display_name
        ),
        &info,
    );

    let _typing = TypingGuard::start(Arc::clone(&ctx.http), channel_id);
    let reply = match relay_exchange(app.provider.as_ref(), &app.store, &key, &starter, catalog.as_ref())
        .await
    {
        Ok(r) => r,
        Err(e) => {
            edit_with_failure(app, ctx, command, &e).await?;
            return Ok(());
        }
    };

    let _ = actions::perform_renames(&ctx.http, Some(guild_id), &reply.renames).await;
    disarm_stop_button(app, &ctx.http, channel_id).await;

    let custom_id = buttons::stop_custom_id(channel_id.get(), command.id.get());
    let (content, reply_embed, link_row) = render_parts(&reply);

    let mut components = Vec::new();
    if let Some(row) = link_row {
        components.push(row);
    }
    components.push(buttons::stop_row(&custom_id));

    let mut builder = CreateMessage::new()
        // The join notice stands in when the model sent no rich block.
        .embed(reply_embed.unwrap_or_else(embed::join_embed))
        .components(components);
    if let Some(content) = content {
        builder = builder.content(content);
    }

    match channel_id.send_message(&ctx.http, builder).await {
        Ok(sent) => {
            app.runtime.stop_messages.insert(
                channel_id.get(),
                StopRecord {
                    message_id: sent.id.get(),
                },
            );
            app.runtime.active_channels.insert(channel_id.get());
            command
                .edit_response(
                    &ctx.http,
                    EditInteractionResponse::new()
                        .content(format!("Reply sent in <#{}>.", channel_id.get())),
                )
                .await?;
        }
        Err(e) => {
            warn!(error = %e, channel = channel_id.get(), "talk: send failed");
            command
                .edit_response(
                    &ctx.http,
                    EditInteractionResponse::new().content("Could not post in that channel."),
                )
                .await?;
        }
    }
    Ok(())
}

/// `/whisper prompt:String` — one ephemeral private exchange.
async fn handle_whisper(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    let prompt = command
        .data
        .options
        .iter()
        .find(|o| o.name == "prompt")
        .and_then(|o| o.value.as_str())
        .unwrap_or("");
    if prompt.is_empty() {
        respond_ephemeral(ctx, command, "Please provide a prompt.").await;
        return Ok(());
    }

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let key = SessionScope::Private {
        user_id: command.user.id.get(),
    }
    .key();
    let info = user_info_for_command(ctx, command);
    let catalog = emoji_catalog(ctx, command.guild_id);
    let prompt = append_user_context(prompt, &info);

    let reply = match relay_exchange(app.provider.as_ref(), &app.store, &key, &prompt, catalog.as_ref())
        .await
    {
        Ok(r) => r,
        Err(e) => {
            edit_with_failure(app, ctx, command, &e).await?;
            return Ok(());
        }
    };

    let _ = actions::perform_renames(&ctx.http, command.guild_id, &reply.renames).await;

    let (content, reply_embed, link_row) = render_parts(&reply);
    let mut response = EditInteractionResponse::new();
    if let Some(content) = content {
        response = response.content(content);
    }
    if let Some(e) = reply_embed {
        response = response.embed(e);
    }
    if let Some(row) = link_row {
        response = response.components(vec![row]);
    }

    command.edit_response(&ctx.http, response).await?;
    Ok(())
}

/// `/stop [channel]` — withdraw from a channel, like the Stop button.
async fn handle_stop(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    if command.guild_id.is_none() {
        respond_ephemeral(ctx, command, "Pick a text channel in a server.").await;
        return Ok(());
    }
    let channel_id = command
        .data
        .options
        .iter()
        .find(|o| o.name == "channel")
        .and_then(|o| o.value.as_channel_id())
        .unwrap_or(command.channel_id);

    disarm_stop_button(app, &ctx.http, channel_id).await;
    app.runtime.active_channels.remove(&channel_id.get());

    let notice = CreateMessage::new().embed(embed::leave_embed());
    if let Err(e) = channel_id.send_message(&ctx.http, notice).await {
        warn!(error = %e, channel = channel_id.get(), "stop: leave notice failed");
    }

    let msg = format!("Sage has been stopped for <#{}>.", channel_id.get());
    respond_ephemeral(ctx, command, &msg).await;
    Ok(())
}

/// `/dm` — open a DM conversation and keep relaying messages there.
async fn handle_dm(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
) -> Result<(), serenity::Error> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let dm = command.user.create_dm_channel(&ctx.http).await?;
    let key = SessionScope::Direct {
        user_id: command.user.id.get(),
    }
    .key();
    let info = user_info_for_command(ctx, command);
    let catalog = emoji_catalog(ctx, command.guild_id);
    let starter = append_user_context(
        &format!(
            "Introduce yourself in one sentence as Sage, in a friendly tone. User: {}",
            info.display_name
        ),
        &info,
    );

    let _typing = TypingGuard::start(Arc::clone(&ctx.http), dm.id);
    let reply = match relay_exchange(app.provider.as_ref(), &app.store, &key, &starter, catalog.as_ref())
        .await
    {
        Ok(r) => r,
        Err(e) => {
            edit_with_failure(app, ctx, command, &e).await?;
            return Ok(());
        }
    };

    let notes = actions::perform_renames(&ctx.http, command.guild_id, &reply.renames).await;

    let (content, reply_embed, link_row) = render_parts(&reply);
    let content = match (&reply_embed, content) {
        (Some(_), _) => None,
        (None, Some(text)) if !notes.is_empty() => Some(send::clip_content(&format!(
            "{}\n\nActions:\n- {}",
            text,
            notes.join("\n- ")
        ))),
        (None, other) => other,
    };

    let mut builder = CreateMessage::new();
    if let Some(content) = content {
        builder = builder.content(content);
    }
    if let Some(e) = reply_embed {
        builder = builder.embed(e);
    }
    if let Some(row) = link_row {
        builder = builder.components(vec![row]);
    }

    dm.id.send_message(&ctx.http, builder).await?;
    app.runtime.active_dms.insert(command.user.id.get());

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().content("DM conversation started."),
        )
        .await?;
    Ok(())
}

/// Platform knowledge about the invoker of a slash command.
fn user_info_for_command(ctx: &Context, command: &CommandInteraction) -> UserInfo {
    let member = command.member.as_deref();
    let display_name = member
        .and_then(|m| m.nick.clone())
        .or_else(|| command.user.global_name.clone())
        .unwrap_or_else(|| command.user.name.clone());

    let mut info = UserInfo {
        display_name,
        user_id: command.user.id.to_string(),
        ..Default::default()
    };
    if let Some(guild_id) = command.guild_id {
        let role_ids: Vec<RoleId> = member.map(|m| m.roles.clone()).unwrap_or_default();
        fill_guild_details(ctx, guild_id, &role_ids, &mut info);
    }
    info
}

/// Replace a deferred response with the appropriate failure message.
async fn edit_with_failure(
    app: &Arc<BotContext>,
    ctx: &Context,
    command: &CommandInteraction,
    err: &ProviderError,
) -> Result<(), serenity::Error> {
    warn!(command = %command.data.name, error = %err, "backend call failed");
    let text = if err.is_unavailable() {
        app.unavailable_message()
    } else {
        "Sorry, something went wrong while calling the model.".to_string()
    };
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(text))
        .await?;
    Ok(())
}

/// Send an ephemeral response to a slash command (only visible to the invoker).
async fn respond_ephemeral(ctx: &Context, command: &CommandInteraction, content: &str) {
    let _ = command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await;
}

/// Render seconds as `1d 2h 3m 4s`, omitting leading zero units.
fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs / 3_600) % 24;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::format_duration;

    #[test]
    fn seconds_only() {
        assert_eq!(format_duration(42), "42s");
    }

    #[test]
    fn full_breakdown() {
        assert_eq!(format_duration(90_061), "1d 1h 1m 1s");
    }

    #[test]
    fn skips_leading_zero_units() {
        assert_eq!(format_duration(3_605), "1h 5s");
    }
}

//! Serenity event handler wired to the relay pipeline.

use std::sync::Arc;

use serenity::async_trait;
use serenity::builder::{
    CreateActionRow, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, EditMessage,
};
use serenity::http::Http;
use serenity::model::application::{ComponentInteraction, Interaction};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId};
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use sage_agent::{append_user_context, relay_exchange, ProviderError, UserInfo};
use sage_reply::{BotReply, EmojiCatalog};
use sage_sessions::SessionScope;

use crate::context::BotContext;
use crate::state::StopRecord;
use crate::typing::TypingGuard;
use crate::{actions, buttons, embed, send};

pub struct DiscordHandler {
    pub app: Arc<BotContext>,
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, "Discord bot connected");
        crate::commands::register_commands(&ctx).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let prompt = msg.content.trim().to_string();
        if prompt.is_empty() {
            return;
        }

        match msg.guild_id {
            None => self.handle_dm_message(&ctx, &msg, &prompt).await,
            Some(guild_id) => {
                self.handle_channel_message(&ctx, &msg, guild_id, &prompt)
                    .await
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                crate::commands::handle_interaction(&self.app, &ctx, &command).await;
            }
            Interaction::Component(component) => {
                self.handle_stop_button(&ctx, &component).await;
            }
            _ => {}
        }
    }
}

impl DiscordHandler {
    /// Relay one message from an active DM conversation.
    async fn handle_dm_message(&self, ctx: &Context, msg: &Message, prompt: &str) {
        let user_id = msg.author.id.get();
        if !self.app.runtime.active_dms.contains(&user_id) {
            return;
        }

        self.record_user(msg);

        let key = SessionScope::Direct { user_id }.key();
        let info = user_info_for_message(ctx, msg);
        let prompt = append_user_context(prompt, &info);

        let _typing = TypingGuard::start(Arc::clone(&ctx.http), msg.channel_id);
        let reply = match relay_exchange(
            self.app.provider.as_ref(),
            &self.app.store,
            &key,
            &prompt,
            None,
        )
        .await
        {
            Ok(r) => r,
            Err(e) => {
                self.report_failure(ctx, msg.channel_id, &key, &e).await;
                return;
            }
        };

        // Renames cannot apply outside a guild; the notes are dropped here.
        let _ = actions::perform_renames(&ctx.http, None, &reply.renames).await;

        let (content, reply_embed, link_row) = render_parts(&reply);
        if content.is_none() && reply_embed.is_none() {
            warn!(session = %key, "empty reply, nothing to send");
            return;
        }

        let mut builder = CreateMessage::new().reference_message(msg);
        if let Some(content) = content {
            builder = builder.content(content);
        }
        if let Some(e) = reply_embed {
            builder = builder.embed(e);
        }
        if let Some(row) = link_row {
            builder = builder.components(vec![row]);
        }

        if let Err(e) = msg.channel_id.send_message(&ctx.http, builder).await {
            warn!(error = %e, session = %key, "DM reply send failed");
        }
    }

    /// Relay one message from an active guild channel.
    async fn handle_channel_message(
        &self,
        ctx: &Context,
        msg: &Message,
        guild_id: GuildId,
        prompt: &str,
    ) {
        let channel_id = msg.channel_id.get();
        if !self.app.runtime.active_channels.contains(&channel_id) {
            return;
        }

        self.record_user(msg);

        let key = SessionScope::Channel {
            guild_id: guild_id.get(),
            channel_id,
        }
        .key();
        let info = user_info_for_message(ctx, msg);
        let catalog = emoji_catalog(ctx, Some(guild_id));
        let prompt = append_user_context(prompt, &info);

        let _typing = TypingGuard::start(Arc::clone(&ctx.http), msg.channel_id);
        let reply = match relay_exchange(
            self.app.provider.as_ref(),
            &self.app.store,
            &key,
            &prompt,
            catalog.as_ref(),
        )
        .await
        {
            Ok(r) => r,
            Err(e) => {
                self.report_failure(ctx, msg.channel_id, &key, &e).await;
                return;
            }
        };

        let _ = actions::perform_renames(&ctx.http, Some(guild_id), &reply.renames).await;

        let (content, reply_embed, link_row) = render_parts(&reply);
        if content.is_none() && reply_embed.is_none() {
            warn!(session = %key, "empty reply, nothing to send");
            return;
        }

        disarm_stop_button(&self.app, &ctx.http, msg.channel_id).await;

        let custom_id = buttons::stop_custom_id(channel_id, msg.id.get());
        let mut components = Vec::new();
        if let Some(row) = link_row {
            components.push(row);
        }
        components.push(buttons::stop_row(&custom_id));

        let mut builder = CreateMessage::new()
            .reference_message(msg)
            .components(components);
        if let Some(content) = content {
            builder = builder.content(content);
        }
        if let Some(e) = reply_embed {
            builder = builder.embed(e);
        }

        match msg.channel_id.send_message(&ctx.http, builder).await {
            Ok(sent) => {
                self.app.runtime.stop_messages.insert(
                    channel_id,
                    StopRecord {
                        message_id: sent.id.get(),
                    },
                );
            }
            Err(e) => warn!(error = %e, session = %key, "channel reply send failed"),
        }
    }

    /// Handle a click on a Stop button: deactivate the channel, strip the
    /// button, post the leave notice.
    async fn handle_stop_button(&self, ctx: &Context, component: &ComponentInteraction) {
        let Some(channel_id) = buttons::parse_stop_custom_id(&component.data.custom_id) else {
            return;
        };

        self.app.runtime.active_channels.remove(&channel_id);
        self.app.runtime.stop_messages.remove(&channel_id);

        let edit = EditMessage::new().components(Vec::new());
        if let Err(e) = component
            .message
            .channel_id
            .edit_message(&ctx.http, component.message.id, edit)
            .await
        {
            warn!(error = %e, "failed to strip stop button");
        }

        let notice = CreateMessage::new().embed(embed::leave_embed());
        if let Err(e) = component.channel_id.send_message(&ctx.http, notice).await {
            warn!(error = %e, "failed to send leave notice");
        }

        let ack = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content("Sage now ignores this channel.")
                .ephemeral(true),
        );
        if let Err(e) = component.create_response(&ctx.http, ack).await {
            warn!(error = %e, "failed to ack stop button");
        }
    }

    async fn report_failure(
        &self,
        ctx: &Context,
        channel_id: ChannelId,
        key: &str,
        err: &ProviderError,
    ) {
        warn!(error = %err, session = %key, "backend call failed");
        let text = if err.is_unavailable() {
            self.app.unavailable_message()
        } else {
            "Sorry, something went wrong while calling the model.".to_string()
        };
        let _ = channel_id.say(&ctx.http, text).await;
    }

    fn record_user(&self, msg: &Message) {
        let discriminator = msg.author.discriminator.map(|d| d.to_string());
        if let Err(e) = self.app.users.record_message(
            &msg.author.id.to_string(),
            &msg.author.name,
            discriminator.as_deref(),
        ) {
            warn!(error = %e, "user stats update failed");
        }
    }
}

/// Split a processed reply into sendable parts. Display text is omitted when
/// a rich-content block is present — the embed carries the whole answer.
pub(crate) fn render_parts(
    reply: &BotReply,
) -> (Option<String>, Option<CreateEmbed>, Option<CreateActionRow>) {
    let reply_embed = reply.rich_content.as_ref().map(embed::build_embed);
    let content = if reply_embed.is_some() || reply.text.is_empty() {
        None
    } else {
        Some(send::clip_content(&reply.text))
    };
    let link_row = buttons::link_row(&reply.links);
    (content, reply_embed, link_row)
}

/// Strip the buttons off the previously armed Stop message, if any.
pub(crate) async fn disarm_stop_button(app: &BotContext, http: &Http, channel_id: ChannelId) {
    if let Some((_, record)) = app.runtime.stop_messages.remove(&channel_id.get()) {
        let edit = EditMessage::new().components(Vec::new());
        if let Err(e) = channel_id
            .edit_message(http, MessageId::new(record.message_id), edit)
            .await
        {
            warn!(error = %e, "failed to disarm previous stop button");
        }
    }
}

/// Platform knowledge about the author of a gateway message.
pub(crate) fn user_info_for_message(ctx: &Context, msg: &Message) -> UserInfo {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    let mut info = UserInfo {
        display_name,
        user_id: msg.author.id.to_string(),
        ..Default::default()
    };
    if let Some(guild_id) = msg.guild_id {
        let role_ids: Vec<RoleId> = msg
            .member
            .as_ref()
            .map(|m| m.roles.clone())
            .unwrap_or_default();
        fill_guild_details(ctx, guild_id, &role_ids, &mut info);
    }
    info
}

/// Add guild name, available emojis and role names from the cache.
pub(crate) fn fill_guild_details(
    ctx: &Context,
    guild_id: GuildId,
    role_ids: &[RoleId],
    info: &mut UserInfo,
) {
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return;
    };
    info.guild_name = Some(guild.name.clone());
    info.emojis = guild
        .emojis
        .values()
        .filter(|e| e.available)
        .map(|e| format!("<:{}:{}>", e.name, e.id))
        .collect();
    info.roles = role_ids
        .iter()
        .filter_map(|rid| guild.roles.get(rid))
        .filter(|r| !r.managed && r.name != "@everyone")
        .map(|r| r.name.clone())
        .collect();
}

/// Emoji catalog for the guild, from the cache. `None` in DM contexts.
pub(crate) fn emoji_catalog(ctx: &Context, guild_id: Option<GuildId>) -> Option<EmojiCatalog> {
    let guild = ctx.cache.guild(guild_id?)?;
    Some(
        guild
            .emojis
            .values()
            .filter(|e| e.available)
            .map(|e| (e.name.clone(), e.id.get()))
            .collect(),
    )
}

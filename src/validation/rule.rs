use super::argument::ArgumentFormat;

/// User-facing error bound to a rule, sent when the rule rejects an invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
    pub footer: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            footer: footer.into(),
        }
    }
}

/// How many positional arguments a command accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgCount {
    Exact(usize),
    /// Inclusive
    #[allow(dead_code)]
    Range { min: usize, max: usize },
}

impl ArgCount {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            ArgCount::Exact(expected) => count == expected,
            ArgCount::Range { min, max } => min <= count && count <= max,
        }
    }
}

/// A single precondition a command invocation must meet.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationRule {
    RequireAdmin(Rejection),
    RequireGuildContext(Rejection),
    RequireArgCount(ArgCount, Rejection),
    /// With `exact`, one format per positional argument.  Otherwise the first format is shared by
    /// every argument.
    RequireArgFormat {
        formats: Vec<ArgumentFormat>,
        exact: bool,
        rejection: Rejection,
    },
    /// Exactly one channel mention.
    RequireChannelMention(Rejection),
    /// The argument at `position` names a voice channel of the invoking guild.
    RequireVoiceChannelByName {
        position: usize,
        rejection: Rejection,
    },
}

impl ValidationRule {
    pub fn admin(message: impl Into<String>, footer: impl Into<String>) -> Self {
        Self::RequireAdmin(Rejection::new(message, footer))
    }

    pub fn guild(message: impl Into<String>, footer: impl Into<String>) -> Self {
        Self::RequireGuildContext(Rejection::new(message, footer))
    }

    pub fn arg_count(
        count: ArgCount,
        message: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self::RequireArgCount(count, Rejection::new(message, footer))
    }

    pub fn arg_format(
        formats: Vec<ArgumentFormat>,
        exact: bool,
        message: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self::RequireArgFormat {
            formats,
            exact,
            rejection: Rejection::new(message, footer),
        }
    }

    pub fn channel_mention(message: impl Into<String>, footer: impl Into<String>) -> Self {
        Self::RequireChannelMention(Rejection::new(message, footer))
    }

    pub fn voice_channel_by_name(
        position: usize,
        message: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self::RequireVoiceChannelByName {
            position,
            rejection: Rejection::new(message, footer),
        }
    }

    /// Position in the fixed evaluation order.
    pub fn rank(&self) -> u8 {
        match self {
            Self::RequireAdmin(_) => 0,
            Self::RequireGuildContext(_) => 1,
            Self::RequireArgCount(..) => 2,
            Self::RequireArgFormat { .. } => 3,
            Self::RequireChannelMention(_) => 4,
            Self::RequireVoiceChannelByName { .. } => 5,
        }
    }

    pub fn rejection(&self) -> &Rejection {
        match self {
            Self::RequireAdmin(rejection)
            | Self::RequireGuildContext(rejection)
            | Self::RequireArgCount(_, rejection)
            | Self::RequireChannelMention(rejection) => rejection,
            Self::RequireArgFormat { rejection, .. }
            | Self::RequireVoiceChannelByName { rejection, .. } => rejection,
        }
    }
}

/// Rules registered for one command, held in evaluation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet(Vec<ValidationRule>);

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = ValidationRule>) -> Self {
        let mut rules: Vec<ValidationRule> = rules.into_iter().collect();
        // Stable, so two rules of the same kind keep their registration order.
        rules.sort_by_key(ValidationRule::rank);
        Self(rules)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationRule> {
        self.0.iter()
    }
}

impl FromIterator<ValidationRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ValidationRule>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_set_orders_by_rank_regardless_of_registration() {
        let rules = RuleSet::new([
            ValidationRule::voice_channel_by_name(0, "no such channel", "vc"),
            ValidationRule::channel_mention("mention", "ch"),
            ValidationRule::arg_count(ArgCount::Exact(1), "count", "ch"),
            ValidationRule::guild("guild", "ch"),
            ValidationRule::admin("admin", "ch"),
        ]);

        let ranks: Vec<u8> = rules.iter().map(ValidationRule::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn arg_count_modes() {
        assert!(ArgCount::Exact(1).accepts(1));
        assert!(!ArgCount::Exact(1).accepts(0));
        assert!(!ArgCount::Exact(1).accepts(2));

        let ranged = ArgCount::Range { min: 1, max: 3 };
        assert!(!ranged.accepts(0));
        assert!(ranged.accepts(1));
        assert!(ranged.accepts(3));
        assert!(!ranged.accepts(4));
    }

    #[test]
    fn rejection_is_bound_per_rule() {
        let rule = ValidationRule::admin("Admin permission required", "shutdown");
        assert_eq!(
            rule.rejection(),
            &Rejection::new("Admin permission required", "shutdown")
        );
    }
}

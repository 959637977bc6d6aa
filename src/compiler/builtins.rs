//! Built-in registries: events, constants and functions of the target runtime.
//!
//! Types are written in source type syntax and parsed on lookup, so the
//! tables stay plain `&'static` data.

use super::error::CompileError;
use super::types::Type;

/// An event trigger: source name, target trigger text, and the arguments the
/// trigger provides.
#[derive(Debug, Clone)]
pub struct EventDef {
    pub name: &'static str,
    pub ow: &'static str,
    /// `(type, target text)` per argument, in order.
    pub args: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone)]
pub struct ConstantDef {
    pub name: &'static str,
    pub ow: &'static str,
    pub ty: &'static str,
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub ty: &'static str,
    /// Target text used when the argument is omitted.
    pub default: Option<&'static str>,
    /// The argument must be a string literal and is emitted as bare quoted
    /// text, as the first argument of `Custom String` requires.
    pub template: bool,
}

/// A target action or value. `ret: None` means the function can only be
/// called as a statement.
#[derive(Debug, Clone)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub ow: &'static str,
    pub params: &'static [ParamDef],
    pub ret: Option<&'static str>,
}

const fn param(name: &'static str, ty: &'static str) -> ParamDef {
    ParamDef { name, ty, default: None, template: false }
}

const fn param_or(name: &'static str, ty: &'static str, default: &'static str) -> ParamDef {
    ParamDef { name, ty, default: Some(default), template: false }
}

const fn template(name: &'static str) -> ParamDef {
    ParamDef { name, ty: "string", default: None, template: true }
}

const DAMAGE_EVENT_ARGS: &[(&str, &str)] = &[
    ("player", "Event Player"),
    ("number", "Event Damage"),
    ("player", "Attacker"),
    ("boolean", "Event Was Critical Hit"),
    ("ability", "Event Ability"),
    ("vector", "Event Direction"),
];

pub static EVENTS: &[EventDef] = &[
    EventDef {
        name: "client", ow: "Ongoing - Each Player",
        args: &[("player", "Event Player")],
    },
    EventDef { name: "server", ow: "Ongoing - Global", args: &[] },
    EventDef {
        name: "playerDied", ow: "Player Died",
        args: &[
            ("player", "Victim"),
            ("player", "Attacker"),
            ("number", "Event Damage"),
            ("boolean", "Event Was Critical Hit"),
            ("button", "Event Ability"),
            ("vector", "Event Direction"),
        ],
    },
    EventDef { name: "playerTookDamage", ow: "Player Took Damage", args: DAMAGE_EVENT_ARGS },
    EventDef { name: "playerDealtDamage", ow: "Player Dealt Damage", args: DAMAGE_EVENT_ARGS },
];

pub static CONSTANTS: &[ConstantDef] = &[
    // ── Teams ───────────────────────────────────────────────────
    ConstantDef { name: "TEAM_ALL", ow: "All Teams", ty: "team" },
    ConstantDef { name: "TEAM_1", ow: "Team 1", ty: "team" },
    ConstantDef { name: "TEAM_2", ow: "Team 2", ty: "team" },
    // ── Colors ──────────────────────────────────────────────────
    ConstantDef { name: "COLOR_WHITE", ow: "Color(White)", ty: "color" },
    ConstantDef { name: "COLOR_BLUE", ow: "Color(Blue)", ty: "color" },
    ConstantDef { name: "COLOR_LIME", ow: "Color(Lime Green)", ty: "color" },
    ConstantDef { name: "COLOR_AQUA", ow: "Color(Aqua)", ty: "color" },
    ConstantDef { name: "COLOR_SKY", ow: "Color(Sky Blue)", ty: "color" },
    ConstantDef { name: "COLOR_GRAY", ow: "Color(Gray)", ty: "color" },
    ConstantDef { name: "COLOR_ROSE", ow: "Color(Rose)", ty: "color" },
    ConstantDef { name: "COLOR_VIOLET", ow: "Color(Violet)", ty: "color" },
    ConstantDef { name: "COLOR_YELLOW", ow: "Color(Yellow)", ty: "color" },
    ConstantDef { name: "COLOR_GREEN", ow: "Color(Green)", ty: "color" },
    ConstantDef { name: "COLOR_RED", ow: "Color(Red)", ty: "color" },
    ConstantDef { name: "COLOR_BLACK", ow: "Color(Black)", ty: "color" },
    ConstantDef { name: "COLOR_TURQUOISE", ow: "Color(Turquoise)", ty: "color" },
    ConstantDef { name: "COLOR_ORANGE", ow: "Color(Orange)", ty: "color" },
    ConstantDef { name: "COLOR_PURPLE", ow: "Color(Purple)", ty: "color" },
    ConstantDef { name: "COLOR_TEAM_1", ow: "Color(Team 1)", ty: "color" },
    ConstantDef { name: "COLOR_TEAM_2", ow: "Color(Team 2)", ty: "color" },
    // ── HUD ─────────────────────────────────────────────────────
    ConstantDef { name: "HUD_LEFT", ow: "Left", ty: "hudpos" },
    ConstantDef { name: "HUD_TOP", ow: "Top", ty: "hudpos" },
    ConstantDef { name: "HUD_RIGHT", ow: "Right", ty: "hudpos" },
    ConstantDef { name: "HUDEVAL_NONE", ow: "None", ty: "hudeval" },
    ConstantDef { name: "SPECTATOR_VISIBLE_DEFAULT", ow: "Default Visibility", ty: "visibility" },
    ConstantDef { name: "SPECTATOR_VISIBLE_ALWAYS", ow: "Visible Always", ty: "visibility" },
    ConstantDef { name: "SPECTATOR_VISIBLE_NEVER", ow: "Visible Never", ty: "visibility" },
    // ── Invisibility / relativity ───────────────────────────────
    ConstantDef { name: "INVISIBLE_TO_ALL", ow: "All", ty: "invis" },
    ConstantDef { name: "INVISIBLE_TO_ENEMIES", ow: "Enemies", ty: "invis" },
    ConstantDef { name: "INVISIBLE_TO_NONE", ow: "None", ty: "invis" },
    ConstantDef { name: "RELATIVE_TO_WORLD", ow: "To World", ty: "relativity" },
    ConstantDef { name: "RELATIVE_TO_PLAYER", ow: "To Player", ty: "relativity" },
    // ── Statuses ────────────────────────────────────────────────
    ConstantDef { name: "STATUS_ASLEEP", ow: "Asleep", ty: "status" },
    ConstantDef { name: "STATUS_BURNING", ow: "Burning", ty: "status" },
    ConstantDef { name: "STATUS_FROZEN", ow: "Frozen", ty: "status" },
    ConstantDef { name: "STATUS_HACKED", ow: "Hacked", ty: "status" },
    ConstantDef { name: "STATUS_INVINCIBLE", ow: "Invincible", ty: "status" },
    ConstantDef { name: "STATUS_KNOCKED_DOWN", ow: "Knocked Down", ty: "status" },
    ConstantDef { name: "STATUS_PHASED_OUT", ow: "Phased Out", ty: "status" },
    ConstantDef { name: "STATUS_ROOTED", ow: "Rooted", ty: "status" },
    ConstantDef { name: "STATUS_STUNNED", ow: "Stunned", ty: "status" },
    ConstantDef { name: "STATUS_UNKILLABLE", ow: "Unkillable", ty: "status" },
    // ── Heroes ──────────────────────────────────────────────────
    ConstantDef { name: "HERO_ANA", ow: "Ana", ty: "hero" },
    ConstantDef { name: "HERO_ASHE", ow: "Ashe", ty: "hero" },
    ConstantDef { name: "HERO_BAPTISTE", ow: "Baptiste", ty: "hero" },
    ConstantDef { name: "HERO_BASTION", ow: "Bastion", ty: "hero" },
    ConstantDef { name: "HERO_BRIGITTE", ow: "Brigitte", ty: "hero" },
    ConstantDef { name: "HERO_CASSIDY", ow: "Cassidy", ty: "hero" },
    ConstantDef { name: "HERO_MCCREE", ow: "Cassidy", ty: "hero" },
    ConstantDef { name: "HERO_DOOMFIST", ow: "Doomfist", ty: "hero" },
    ConstantDef { name: "HERO_DVA", ow: "D.Va", ty: "hero" },
    ConstantDef { name: "HERO_ECHO", ow: "Echo", ty: "hero" },
    ConstantDef { name: "HERO_GENJI", ow: "Genji", ty: "hero" },
    ConstantDef { name: "HERO_HANZO", ow: "Hanzo", ty: "hero" },
    ConstantDef { name: "HERO_ILLARI", ow: "Illari", ty: "hero" },
    ConstantDef { name: "HERO_JUNKER_QUEEN", ow: "Junker Queen", ty: "hero" },
    ConstantDef { name: "HERO_JUNKRAT", ow: "Junkrat", ty: "hero" },
    ConstantDef { name: "HERO_KIRIKO", ow: "Kiriko", ty: "hero" },
    ConstantDef { name: "HERO_LIFEWEAVER", ow: "Lifeweaver", ty: "hero" },
    ConstantDef { name: "HERO_LUCIO", ow: "Lúcio", ty: "hero" },
    ConstantDef { name: "HERO_MEI", ow: "Mei", ty: "hero" },
    ConstantDef { name: "HERO_MERCY", ow: "Mercy", ty: "hero" },
    ConstantDef { name: "HERO_MOIRA", ow: "Moira", ty: "hero" },
    ConstantDef { name: "HERO_ORISA", ow: "Orisa", ty: "hero" },
    ConstantDef { name: "HERO_PHARAH", ow: "Pharah", ty: "hero" },
    ConstantDef { name: "HERO_RAMATTRA", ow: "Ramattra", ty: "hero" },
    ConstantDef { name: "HERO_REAPER", ow: "Reaper", ty: "hero" },
    ConstantDef { name: "HERO_REINHARDT", ow: "Reinhardt", ty: "hero" },
    ConstantDef { name: "HERO_ROADHOG", ow: "Roadhog", ty: "hero" },
    ConstantDef { name: "HERO_SIGMA", ow: "Sigma", ty: "hero" },
    ConstantDef { name: "HERO_SOJOURN", ow: "Sojourn", ty: "hero" },
    ConstantDef { name: "HERO_SOLDIER_76", ow: "Soldier 76", ty: "hero" },
    ConstantDef { name: "HERO_SOMBRA", ow: "Sombra", ty: "hero" },
    ConstantDef { name: "HERO_SYMMETRA", ow: "Symmetra", ty: "hero" },
    ConstantDef { name: "HERO_TORBJORN", ow: "Torbjörn", ty: "hero" },
    ConstantDef { name: "HERO_TRACER", ow: "Tracer", ty: "hero" },
    ConstantDef { name: "HERO_WIDOWMAKER", ow: "Widowmaker", ty: "hero" },
    ConstantDef { name: "HERO_WINSTON", ow: "Winston", ty: "hero" },
    ConstantDef { name: "HERO_WRECKING_BALL", ow: "Wrecking Ball", ty: "hero" },
    ConstantDef { name: "HERO_ZARYA", ow: "Zarya", ty: "hero" },
    ConstantDef { name: "HERO_ZENYATTA", ow: "Zenyatta", ty: "hero" },
];

pub static FUNCTIONS: &[BuiltinFn] = &[
    // ── Actions ─────────────────────────────────────────────────
    BuiltinFn {
        name: "disableGameModeHUD", ow: "Disable Game Mode HUD",
        params: &[param("player", "player | player[]")], ret: None,
    },
    BuiltinFn {
        name: "disableMessages", ow: "Disable Messages",
        params: &[param("player", "player | player[]")], ret: None,
    },
    BuiltinFn {
        name: "setInvisible", ow: "Set Invisible",
        params: &[
            param("player", "player | player[]"),
            param_or("invisibleTo", "invis", "All"),
        ],
        ret: None,
    },
    BuiltinFn {
        name: "createHUDText", ow: "Create HUD Text",
        params: &[
            param("visibleTo", "player | player[]"),
            param("header", "any"),
            param_or("subheader", "any", "Null"),
            param_or("text", "any", "Null"),
            param_or("location", "hudpos", "Left"),
            param_or("sortOrder", "number", "0"),
            param_or("headerColor", "color", "Color(White)"),
            param_or("subheaderColor", "color", "Color(White)"),
            param_or("textColor", "color", "Color(White)"),
            param_or("reevaluation", "hudeval", "None"),
            param_or("spectators", "visibility", "Default Visibility"),
        ],
        ret: None,
    },
    BuiltinFn {
        name: "smallMessage", ow: "Small Message",
        params: &[param("visibleTo", "player | player[]"), param("header", "any")],
        ret: None,
    },
    BuiltinFn {
        name: "bigMessage", ow: "Big Message",
        params: &[param("visibleTo", "player | player[]"), param("header", "any")],
        ret: None,
    },
    BuiltinFn {
        name: "wait", ow: "Wait",
        params: &[param("time", "number"), param_or("behavior", "waitbehavior", "Ignore Condition")],
        ret: None,
    },
    BuiltinFn {
        name: "kill", ow: "Kill",
        params: &[param("player", "player | player[]"), param_or("killer", "player", "Null")],
        ret: None,
    },
    BuiltinFn {
        name: "damage", ow: "Damage",
        params: &[
            param("player", "player | player[]"),
            param("damager", "player"),
            param("amount", "number"),
        ],
        ret: None,
    },
    BuiltinFn {
        name: "setStatus", ow: "Set Status",
        params: &[
            param("player", "player | player[]"),
            param("assister", "player"),
            param("status", "status"),
            param("duration", "number"),
        ],
        ret: None,
    },
    BuiltinFn {
        name: "teleport", ow: "Teleport",
        params: &[param("player", "player | player[]"), param("position", "vector")],
        ret: None,
    },
    // ── Values ──────────────────────────────────────────────────
    BuiltinFn {
        name: "allPlayers", ow: "All Players",
        params: &[param_or("team", "team", "All Teams")],
        ret: Some("player[]"),
    },
    BuiltinFn { name: "eventPlayer", ow: "Event Player", params: &[], ret: Some("player") },
    BuiltinFn {
        name: "vector", ow: "Vector",
        params: &[param("x", "number"), param("y", "number"), param("z", "number")],
        ret: Some("vector"),
    },
    BuiltinFn {
        name: "positionOf", ow: "Position Of",
        params: &[param("player", "player")], ret: Some("vector"),
    },
    BuiltinFn { name: "heroOf", ow: "Hero Of", params: &[param("player", "player")], ret: Some("hero") },
    BuiltinFn { name: "health", ow: "Health", params: &[param("player", "player")], ret: Some("number") },
    BuiltinFn { name: "isAlive", ow: "Is Alive", params: &[param("player", "player")], ret: Some("boolean") },
    BuiltinFn { name: "count", ow: "Count Of", params: &[param("array", "any[]")], ret: Some("number") },
    BuiltinFn { name: "abs", ow: "Absolute Value", params: &[param("value", "number")], ret: Some("number") },
    BuiltinFn {
        name: "max", ow: "Max",
        params: &[param("a", "number"), param("b", "number")], ret: Some("number"),
    },
    BuiltinFn {
        name: "min", ow: "Min",
        params: &[param("a", "number"), param("b", "number")], ret: Some("number"),
    },
    BuiltinFn {
        name: "random", ow: "Random Real",
        params: &[param("min", "number"), param("max", "number")], ret: Some("number"),
    },
    BuiltinFn {
        name: "format", ow: "Custom String",
        params: &[template("template"), param("values", "...any")],
        ret: Some("string"),
    },
];

pub fn lookup_event(name: &str) -> Option<&'static EventDef> {
    EVENTS.iter().find(|e| e.name == name)
}

pub fn lookup_constant(name: &str) -> Option<&'static ConstantDef> {
    CONSTANTS.iter().find(|c| c.name == name)
}

pub fn lookup_function(name: &str) -> Option<&'static BuiltinFn> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Parse a registry type string.
pub fn registry_type(ty: &str) -> Result<Type, CompileError> {
    ty.parse()
}

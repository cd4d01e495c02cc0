// setter.rs — 系统壁纸设置模块
// 先探测桌面环境，再映射到对应的命令行工具

use std::path::Path;
use std::process::Command;

use url::Url;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopEnvironment {
    MacOs,
    Xfce,
    Gnome2,
    Gnome3,
    Unity,
    /// 能识别但没有对应的设置命令
    Kde,
    Unknown,
}

impl DesktopEnvironment {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Xfce => "Xfce",
            Self::Gnome2 => "GNOME 2",
            Self::Gnome3 => "GNOME 3",
            Self::Unity => "Unity",
            Self::Kde => "KDE",
            Self::Unknown => "unknown",
        }
    }
}

/// 桌面环境探测所需的原始信息（环境变量与辅助工具输出）
#[derive(Debug, Clone, Default)]
pub struct DesktopSignals {
    pub macos: bool,
    /// `xprop -root _DT_SAVE_MODE` 的输出
    pub dt_save_mode: Option<String>,
    pub desktop_session: Option<String>,
    pub kde_full_session: Option<String>,
    pub xdg_current_desktop: Option<String>,
    pub gnome_session_id: Option<String>,
    /// `gnome-session --version` 的输出，仅在存在 GNOME 会话 ID 时探测
    pub gnome_version: Option<String>,
}

impl DesktopSignals {
    /// 读取当前进程的环境变量并调用探测工具
    pub fn gather() -> Self {
        if cfg!(target_os = "macos") {
            return Self {
                macos: true,
                ..Self::default()
            };
        }

        let gnome_session_id = std::env::var("GNOME_DESKTOP_SESSION_ID").ok();
        let gnome_version = if gnome_session_id.is_some() {
            command_output("gnome-session", &["--version"])
        } else {
            None
        };

        Self {
            macos: false,
            dt_save_mode: command_output("xprop", &["-root", "_DT_SAVE_MODE"]),
            desktop_session: std::env::var("DESKTOP_SESSION").ok(),
            kde_full_session: std::env::var("KDE_FULL_SESSION").ok(),
            xdg_current_desktop: std::env::var("XDG_CURRENT_DESKTOP").ok(),
            gnome_session_id,
            gnome_version,
        }
    }
}

/// 运行探测工具并返回标准输出；工具不存在或失败时返回 None
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            tracing::debug!(program, status = %output.status, "detection command exited unsuccessfully");
            None
        }
        Err(e) => {
            tracing::debug!(program, error = %e, "detection command unavailable");
            None
        }
    }
}

/// 根据探测结果判断桌面环境，按优先级依次匹配
pub fn classify(signals: &DesktopSignals) -> DesktopEnvironment {
    if signals.macos {
        return DesktopEnvironment::MacOs;
    }

    let dt_save_is_xfce = signals
        .dt_save_mode
        .as_deref()
        .is_some_and(|mode| mode.contains("xfce4"));
    if dt_save_is_xfce || signals.desktop_session.as_deref() == Some("xfce") {
        return DesktopEnvironment::Xfce;
    }

    if signals.kde_full_session.as_deref() == Some("true") {
        return DesktopEnvironment::Kde;
    }

    let xdg = signals
        .xdg_current_desktop
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    if xdg.contains("unity") {
        return DesktopEnvironment::Unity;
    }

    if signals.gnome_session_id.is_some() {
        match signals.gnome_version.as_deref().and_then(major_version) {
            Some(2) => return DesktopEnvironment::Gnome2,
            Some(major) if major >= 3 => return DesktopEnvironment::Gnome3,
            _ => {}
        }
    }

    // 新版 GNOME 不再导出 GNOME_DESKTOP_SESSION_ID
    if xdg.contains("gnome") {
        return DesktopEnvironment::Gnome3;
    }

    DesktopEnvironment::Unknown
}

/// "gnome-session 3.36.0" -> 3
fn major_version(output: &str) -> Option<u32> {
    output
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
        .and_then(|version| version.split('.').next())
        .and_then(|major| major.parse().ok())
}

/// 待执行的壁纸设置命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperCommand {
    pub program: &'static str,
    pub args: Vec<String>,
}

/// 把桌面环境映射为设置命令；`path` 必须是绝对路径
pub fn command_for(desktop: DesktopEnvironment, path: &Path) -> AppResult<WallpaperCommand> {
    let path_str = path.to_string_lossy();

    let command = match desktop {
        DesktopEnvironment::MacOs => WallpaperCommand {
            program: "osascript",
            args: vec![
                "-e".to_string(),
                format!(
                    "tell application \"Finder\" to set desktop picture to POSIX file \"{}\"",
                    applescript_escape(&path_str)
                ),
            ],
        },
        DesktopEnvironment::Xfce => WallpaperCommand {
            program: "xfconf-query",
            args: vec![
                "-c".to_string(),
                "xfce4-desktop".to_string(),
                "-p".to_string(),
                "/backdrop/screen0/monitor0/image-path".to_string(),
                "-s".to_string(),
                path_str.into_owned(),
            ],
        },
        DesktopEnvironment::Gnome3 | DesktopEnvironment::Unity => {
            let uri = Url::from_file_path(path).map_err(|_| AppError::SetterFailed {
                program: "gsettings".to_string(),
                reason: format!("not an absolute path: {}", path.display()),
            })?;
            WallpaperCommand {
                program: "gsettings",
                args: vec![
                    "set".to_string(),
                    "org.gnome.desktop.background".to_string(),
                    "picture-uri".to_string(),
                    uri.to_string(),
                ],
            }
        }
        DesktopEnvironment::Gnome2 => WallpaperCommand {
            program: "gconftool-2",
            args: vec![
                "-t".to_string(),
                "str".to_string(),
                "--set".to_string(),
                "/desktop/gnome/background/picture_filename".to_string(),
                path_str.into_owned(),
            ],
        },
        DesktopEnvironment::Kde | DesktopEnvironment::Unknown => {
            return Err(AppError::UnsupportedDesktop(desktop.name().to_string()));
        }
    };

    Ok(command)
}

fn applescript_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 将指定路径的图片设置为系统壁纸，返回识别到的桌面环境
pub fn set_from_path(path: impl AsRef<Path>) -> AppResult<DesktopEnvironment> {
    // 各工具都需要绝对路径，顺便确认文件存在
    let absolute = std::fs::canonicalize(path.as_ref())?;

    let desktop = classify(&DesktopSignals::gather());
    tracing::debug!(desktop = desktop.name(), "desktop environment detected");

    let command = command_for(desktop, &absolute)?;
    run(&command)?;
    Ok(desktop)
}

fn run(command: &WallpaperCommand) -> AppResult<()> {
    tracing::debug!(program = command.program, args = ?command.args, "running wallpaper command");

    let output = Command::new(command.program)
        .args(&command.args)
        .output()
        .map_err(|e| AppError::SetterFailed {
            program: command.program.to_string(),
            reason: e.to_string(),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(AppError::SetterFailed {
            program: command.program.to_string(),
            reason: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn signals() -> DesktopSignals {
        DesktopSignals::default()
    }

    #[test]
    fn test_classify_macos() {
        let p = DesktopSignals {
            macos: true,
            kde_full_session: Some("true".to_string()),
            ..signals()
        };
        assert_eq!(classify(&p), DesktopEnvironment::MacOs);
    }

    #[test]
    fn test_classify_xfce() {
        let by_xprop = DesktopSignals {
            dt_save_mode: Some("_DT_SAVE_MODE(STRING) = \"xfce4\"\n".to_string()),
            ..signals()
        };
        assert_eq!(classify(&by_xprop), DesktopEnvironment::Xfce);

        let by_session = DesktopSignals {
            desktop_session: Some("xfce".to_string()),
            ..signals()
        };
        assert_eq!(classify(&by_session), DesktopEnvironment::Xfce);
    }

    #[test]
    fn test_classify_kde_and_unity() {
        let kde = DesktopSignals {
            kde_full_session: Some("true".to_string()),
            ..signals()
        };
        assert_eq!(classify(&kde), DesktopEnvironment::Kde);

        let unity = DesktopSignals {
            xdg_current_desktop: Some("Unity".to_string()),
            ..signals()
        };
        assert_eq!(classify(&unity), DesktopEnvironment::Unity);
    }

    #[test]
    fn test_classify_gnome_versions() {
        let gnome2 = DesktopSignals {
            gnome_session_id: Some("this-is-deprecated".to_string()),
            gnome_version: Some("gnome-session 2.32.1\n".to_string()),
            ..signals()
        };
        assert_eq!(classify(&gnome2), DesktopEnvironment::Gnome2);

        let gnome3 = DesktopSignals {
            gnome_session_id: Some("this-is-deprecated".to_string()),
            gnome_version: Some("gnome-session 3.36.0\n".to_string()),
            ..signals()
        };
        assert_eq!(classify(&gnome3), DesktopEnvironment::Gnome3);

        let modern = DesktopSignals {
            xdg_current_desktop: Some("ubuntu:GNOME".to_string()),
            ..signals()
        };
        assert_eq!(classify(&modern), DesktopEnvironment::Gnome3);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify(&signals()), DesktopEnvironment::Unknown);

        let sway = DesktopSignals {
            xdg_current_desktop: Some("sway".to_string()),
            desktop_session: Some("sway".to_string()),
            ..signals()
        };
        assert_eq!(classify(&sway), DesktopEnvironment::Unknown);
    }

    #[test]
    fn test_macos_command() {
        let path = PathBuf::from("/Users/me/Pictures/Profound Programmer/a.png");
        let command = command_for(DesktopEnvironment::MacOs, &path).unwrap();
        assert_eq!(command.program, "osascript");
        assert_eq!(
            command.args,
            vec![
                "-e".to_string(),
                "tell application \"Finder\" to set desktop picture to POSIX file \"/Users/me/Pictures/Profound Programmer/a.png\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_applescript_quotes_are_escaped() {
        let path = PathBuf::from("/tmp/say \"hi\".png");
        let command = command_for(DesktopEnvironment::MacOs, &path).unwrap();
        assert!(command.args[1].ends_with("POSIX file \"/tmp/say \\\"hi\\\".png\""));
    }

    #[test]
    fn test_linux_commands() {
        let path = PathBuf::from("/home/me/Pictures/Profound Programmer/a.png");

        let xfce = command_for(DesktopEnvironment::Xfce, &path).unwrap();
        assert_eq!(xfce.program, "xfconf-query");
        assert_eq!(xfce.args.last().map(String::as_str), Some("/home/me/Pictures/Profound Programmer/a.png"));

        let gnome3 = command_for(DesktopEnvironment::Gnome3, &path).unwrap();
        assert_eq!(gnome3.program, "gsettings");
        assert_eq!(
            gnome3.args,
            vec![
                "set",
                "org.gnome.desktop.background",
                "picture-uri",
                "file:///home/me/Pictures/Profound%20Programmer/a.png",
            ]
        );
        assert_eq!(command_for(DesktopEnvironment::Unity, &path).unwrap(), gnome3);

        let gnome2 = command_for(DesktopEnvironment::Gnome2, &path).unwrap();
        assert_eq!(gnome2.program, "gconftool-2");
        assert_eq!(gnome2.args[3], "/desktop/gnome/background/picture_filename");
    }

    #[test]
    fn test_unsupported_desktops() {
        let path = PathBuf::from("/tmp/a.png");
        assert!(matches!(
            command_for(DesktopEnvironment::Kde, &path),
            Err(AppError::UnsupportedDesktop(name)) if name == "KDE"
        ));
        assert!(matches!(
            command_for(DesktopEnvironment::Unknown, &path),
            Err(AppError::UnsupportedDesktop(_))
        ));
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("gnome-session 3.36.0"), Some(3));
        assert_eq!(major_version("gnome-session 2.32.1\n"), Some(2));
        assert_eq!(major_version("gnome-session"), None);
    }
}

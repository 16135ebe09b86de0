use anyhow::Result;
use std::collections::BTreeSet;

/// One entry of a process snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub name: String,
    /// Runs in the interactive user's session.
    pub user_owned: bool,
}

/// Distinct, sorted `.exe` names of user-owned processes.
pub fn distinct_executables<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = ProcessEntry>,
{
    entries
        .into_iter()
        .filter(|entry| entry.user_owned && entry.name.to_ascii_lowercase().contains(".exe"))
        .map(|entry| entry.name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Executable names the UI can offer when creating a profile.
pub fn list_executables() -> Result<Vec<String>> {
    Ok(distinct_executables(snapshot()?))
}

#[cfg(windows)]
fn snapshot() -> Result<Vec<ProcessEntry>> {
    use anyhow::Context;
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::RemoteDesktop::ProcessIdToSessionId;
    use windows::Win32::System::Threading::GetCurrentProcessId;

    unsafe {
        let mut own_session = 0u32;
        ProcessIdToSessionId(GetCurrentProcessId(), &mut own_session)
            .context("Failed to resolve current session")?;

        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .context("Failed to snapshot processes")?;

        let mut entries = Vec::new();
        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut more = Process32FirstW(snapshot, &mut entry).is_ok();
        while more {
            let name = String::from_utf16_lossy(
                &entry
                    .szExeFile
                    .iter()
                    .take_while(|&&c| c != 0)
                    .copied()
                    .collect::<Vec<_>>(),
            );

            let mut session = 0u32;
            let user_owned = own_session != 0
                && ProcessIdToSessionId(entry.th32ProcessID, &mut session).is_ok()
                && session == own_session;

            entries.push(ProcessEntry { name, user_owned });
            more = Process32NextW(snapshot, &mut entry).is_ok();
        }

        let _ = CloseHandle(snapshot);
        Ok(entries)
    }
}

#[cfg(not(windows))]
fn snapshot() -> Result<Vec<ProcessEntry>> {
    Ok(Vec::new())
}

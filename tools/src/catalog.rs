//! Built-in tool catalog

use crate::registry::{Category, Tool};

const fn tool(
    id: u32,
    name: &'static str,
    description: &'static str,
    command: &'static str,
    help_command: Option<&'static str>,
) -> Tool {
    Tool {
        id,
        name,
        description,
        command,
        help_command,
    }
}

pub const BUILTIN_CATEGORIES: &[Category] = &[
    Category {
        name: "Reconnaissance",
        icon: "🔍",
        tools: &[
            tool(1, "Nmap", "Network discovery and security auditing", "nmap", Some("nmap --help")),
            tool(2, "Recon-ng", "Web reconnaissance framework", "recon-ng", Some("recon-ng --help")),
            tool(3, "theHarvester", "Email and subdomain gathering", "theHarvester", Some("theHarvester --help")),
            tool(4, "Maltego", "Link analysis and data mining", "maltego", None),
            tool(5, "Shodan", "Internet connected device search", "shodan", None),
        ],
    },
    Category {
        name: "Web Application",
        icon: "🌐",
        tools: &[
            tool(11, "Burp Suite", "Web application security testing", "burpsuite", Some("echo 'Starting Burp Suite... (GUI tool)'")),
            tool(12, "OWASP ZAP", "Web application scanner", "zap", Some("zap --help")),
            tool(13, "Nikto", "Web server scanner", "nikto", Some("nikto --help")),
            tool(14, "SQLmap", "SQL injection tool", "sqlmap", Some("sqlmap --help")),
            tool(15, "Wfuzz", "Web application fuzzer", "wfuzz", Some("wfuzz --help")),
        ],
    },
    Category {
        name: "Password Tools",
        icon: "🔐",
        tools: &[
            tool(21, "John the Ripper", "Password cracker", "john", Some("john --help")),
            tool(22, "Hashcat", "Advanced password recovery", "hashcat", Some("hashcat --help")),
            tool(23, "Hydra", "Network logon cracker", "hydra", Some("hydra --help")),
            tool(24, "Crunch", "Wordlist generator", "crunch", Some("crunch --help")),
            tool(25, "CeWL", "Custom wordlist generator", "cewl", Some("cewl --help")),
        ],
    },
    Category {
        name: "Wireless Tools",
        icon: "📡",
        tools: &[
            tool(31, "Aircrack-ng", "WiFi security auditing", "aircrack-ng", Some("aircrack-ng --help")),
            tool(32, "Kismet", "Wireless network detector", "kismet", Some("kismet --help")),
            tool(33, "Wifite", "Automated wireless auditor", "wifite", Some("wifite --help")),
            tool(34, "Fern Wifi Cracker", "Wireless security tool", "fern-wifi-cracker", None),
            tool(35, "PixieWPS", "WPS PIN recovery", "pixiewps", None),
        ],
    },
    Category {
        name: "System Tools",
        icon: "⚡",
        tools: &[
            tool(41, "Metasploit", "Penetration testing framework", "msfconsole", Some("msfconsole --version")),
            tool(42, "Wireshark", "Network protocol analyzer", "wireshark", Some("wireshark --version")),
            tool(43, "Ettercap", "Network security tool", "ettercap", Some("ettercap --help")),
            tool(44, "Netcat", "Network utility", "nc", Some("nc -h")),
            tool(45, "SET", "Social Engineering Toolkit", "setoolkit", Some("setoolkit --help")),
        ],
    },
];
